use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancel flag for one download.
///
/// It only raises the flag. The run loop notices it on its next tick and
/// kills the process tree.
#[derive(Debug, Clone, Default)]
pub struct CancellationController {
    requested: Arc<AtomicBool>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that raised the flag.
    pub fn request_cancel(&self) -> bool {
        !self.requested.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_cancel_is_idempotent() {
        let cancel = CancellationController::new();
        assert!(!cancel.is_cancelled());

        assert!(cancel.request_cancel());
        assert!(!cancel.request_cancel());
        assert!(!cancel.clone().request_cancel());
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_concurrent_requests_raise_once() {
        let cancel = CancellationController::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cancel = cancel.clone();
                std::thread::spawn(move || cancel.request_cancel())
            })
            .collect();

        let raised = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|raised| *raised)
            .count();
        assert_eq!(raised, 1);
    }
}
