use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

/// Single slot holding the last output path yt-dlp announced.
///
/// Clones share the slot: the run loop writes, the completion path and
/// callers read.
#[derive(Debug, Clone, Default)]
pub struct FilePathTracker {
    slot: Arc<Mutex<Option<PathBuf>>>,
}

impl FilePathTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, path: impl AsRef<Path>) {
        *self.slot.lock() = Some(path.as_ref().to_path_buf());
    }

    pub fn get(&self) -> Option<PathBuf> {
        self.slot.lock().clone()
    }

    pub fn clear(&self) {
        self.slot.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_and_clear_empties() {
        let tracker = FilePathTracker::new();
        assert_eq!(tracker.get(), None);

        tracker.set("/tmp/video.f137.mp4");
        tracker.set("/tmp/video.mp4");
        assert_eq!(tracker.get(), Some(PathBuf::from("/tmp/video.mp4")));

        tracker.clear();
        assert_eq!(tracker.get(), None);
    }

    #[test]
    fn test_clones_share_the_slot_across_threads() {
        let tracker = FilePathTracker::new();
        let writer = tracker.clone();

        std::thread::spawn(move || {
            for i in 0..100 {
                writer.set(format!("/tmp/part{}.mp4", i));
            }
        })
        .join()
        .unwrap();

        assert_eq!(tracker.get(), Some(PathBuf::from("/tmp/part99.mp4")));
    }
}
