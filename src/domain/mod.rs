pub mod error;
pub mod model;

pub use error::{DownloadError, FailureCause};
pub use model::{
    AudioBitrate, DownloadEvent, DownloadPhase, DownloadRequest, MediaFormat, ProgressEvent,
    TerminalResult, VideoResolution,
};
