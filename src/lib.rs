//! Drives yt-dlp as a child process and turns its text output into a
//! single ordered stream of download events.

pub mod application;
pub mod domain;
pub mod utils;
pub mod ytdlp;

pub use application::{DownloadControls, DownloadCoordinator, DownloadHandle};
pub use domain::{
    AudioBitrate, DownloadError, DownloadEvent, DownloadPhase, DownloadRequest, FailureCause,
    MediaFormat, ProgressEvent, TerminalResult, VideoResolution,
};
pub use ytdlp::ToolConfig;
