pub mod args;
pub mod classifier;
pub mod config;

pub use args::build_args;
pub use classifier::{classify_line, classify_stderr, Classified, StderrKind};
pub use config::ToolConfig;
