pub mod cancellation;
pub mod download_coordinator;
mod orchestrator;
pub mod path_tracker;

pub use cancellation::CancellationController;
pub use download_coordinator::{DownloadControls, DownloadCoordinator, DownloadHandle};
pub use path_tracker::FilePathTracker;
