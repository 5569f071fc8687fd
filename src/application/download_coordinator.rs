use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::{stream::BoxStream, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;

use crate::{
    application::{orchestrator::DownloadRun, CancellationController, FilePathTracker},
    domain::{DownloadError, DownloadEvent, DownloadRequest},
    ytdlp::{build_args, ToolConfig},
};

/// Entry point for callers: starts downloads, one at a time.
#[derive(Clone)]
pub struct DownloadCoordinator {
    config: Arc<ToolConfig>,
    program: PathBuf,
    active: Arc<AtomicBool>,
}

impl DownloadCoordinator {
    /// Fails when yt-dlp cannot be found where `config` says it is.
    pub fn new(config: ToolConfig) -> Result<Self, DownloadError> {
        let program = config
            .resolve_program()
            .ok_or_else(|| DownloadError::ToolMissing(config.program.clone()))?;
        info!("Using yt-dlp at {}", program.display());

        Ok(Self {
            config: Arc::new(config),
            program,
            active: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Check preconditions, then hand the download to its own tokio task.
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// [`DownloadError::Busy`] while a previous download has not yet
    /// produced its terminal event.
    pub fn start_download(&self, request: DownloadRequest) -> Result<DownloadHandle, DownloadError> {
        if request.url.trim().is_empty() {
            return Err(DownloadError::EmptyUrl);
        }

        let slot = ActiveSlot::acquire(&self.active).ok_or(DownloadError::Busy)?;
        prepare_output_dir(&request.output_dir)?;
        // Each download gets its own path cell, so an old handle keeps
        // reporting its own file.
        let destination = FilePathTracker::new();
        let cancel = CancellationController::new();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let run = DownloadRun {
            config: Arc::clone(&self.config),
            program: self.program.clone(),
            args: build_args(&request),
            cancel: cancel.clone(),
            destination: destination.clone(),
            events: events_tx,
        };

        info!(
            "Starting {} download of {} into {}",
            request.format,
            request.url,
            request.output_dir.display()
        );

        tokio::spawn(async move {
            let result = run.execute().await;
            // Free the slot first so a caller reacting to the terminal
            // event can start the next download right away.
            drop(slot);
            info!("Download finished: {:?}", result);
            let _ = run.events.send(DownloadEvent::Terminal(result));
        });

        Ok(DownloadHandle {
            controls: DownloadControls {
                cancel,
                destination,
            },
            events: events_rx,
        })
    }
}

/// The running download as seen by its caller.
///
/// Events arrive in the order yt-dlp printed them; the last one is always a
/// [`DownloadEvent::Terminal`], after which the channel closes.
pub struct DownloadHandle {
    controls: DownloadControls,
    events: UnboundedReceiver<DownloadEvent>,
}

impl DownloadHandle {
    pub fn controls(&self) -> DownloadControls {
        self.controls.clone()
    }

    pub fn cancel(&self) -> bool {
        self.controls.cancel()
    }

    pub fn resolved_file_path(&self) -> Option<PathBuf> {
        self.controls.resolved_file_path()
    }

    pub async fn next_event(&mut self) -> Option<DownloadEvent> {
        self.events.recv().await
    }

    pub fn into_stream(self) -> BoxStream<'static, DownloadEvent> {
        futures::stream::unfold(self.events, |mut events| async move {
            events.recv().await.map(|event| (event, events))
        })
        .boxed()
    }
}

/// Cancel and path lookup, detached from the event receiver.
#[derive(Debug, Clone)]
pub struct DownloadControls {
    cancel: CancellationController,
    destination: FilePathTracker,
}

impl DownloadControls {
    /// Idempotent. Returns `true` only for the first request.
    pub fn cancel(&self) -> bool {
        self.cancel.request_cancel()
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn resolved_file_path(&self) -> Option<PathBuf> {
        self.destination.get()
    }
}

struct ActiveSlot(Arc<AtomicBool>);

impl ActiveSlot {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ActiveSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn prepare_output_dir(dir: &Path) -> Result<(), DownloadError> {
    let fail = |reason: String| DownloadError::OutputDirectory {
        path: dir.to_path_buf(),
        reason,
    };

    std::fs::create_dir_all(dir).map_err(|e| fail(e.to_string()))?;
    if !dir.is_dir() {
        return Err(fail("not a directory".to_string()));
    }
    Ok(())
}
