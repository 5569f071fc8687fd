use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "simple_video_downloader=info";

/// Install the global fmt subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
