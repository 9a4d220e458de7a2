//! Upload Progress
//!
//! Turns byte-level upload callbacks into a 0-100 percentage.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Receives the upload percentage whenever it changes
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

const UNREPORTED: u16 = u16::MAX;

/// Percentage of `loaded` over `total`, rounded and capped at 100.
/// A zero `total` is treated as one byte.
pub fn percent(loaded: u64, total: u64) -> u8 {
    let total = total.max(1) as f64;
    let value = (loaded as f64 * 100.0 / total).round();
    value.clamp(0.0, 100.0) as u8
}

/// Reports upload progress for one upload attempt
pub struct ProgressTracker {
    callback: ProgressCallback,
    last: AtomicU16,
}

impl ProgressTracker {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback,
            last: AtomicU16::new(UNREPORTED),
        }
    }

    /// Every attempt begins at zero
    pub fn start(&self) {
        self.emit(0);
    }

    /// Record cumulative bytes sent
    pub fn update(&self, loaded: u64, total: u64) {
        self.emit(percent(loaded, total));
    }

    /// Last percentage reported, if any
    pub fn current(&self) -> Option<u8> {
        match self.last.load(Ordering::Acquire) {
            UNREPORTED => None,
            value => Some(value as u8),
        }
    }

    fn emit(&self, value: u8) {
        let previous = self.last.swap(value as u16, Ordering::AcqRel);
        if previous == value as u16 {
            return;
        }
        (self.callback)(value);
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("current", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 200), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(200, 200), 100);
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(5, 0), 100);
    }

    #[test]
    fn test_tracker_reports_changes_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let tracker = ProgressTracker::new(Arc::new(move |p| sink.lock().unwrap().push(p)));

        tracker.start();
        tracker.update(10, 1000);
        tracker.update(1, 1000);
        tracker.update(500, 1000);
        tracker.update(1000, 1000);
        tracker.update(1000, 1000);

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 0, 50, 100]);
        assert_eq!(tracker.current(), Some(100));
    }

    #[test]
    fn test_tracker_unreported_until_first_update() {
        let tracker = ProgressTracker::new(Arc::new(|_| {}));
        assert_eq!(tracker.current(), None);
        tracker.update(3, 4);
        assert_eq!(tracker.current(), Some(75));
    }
}
