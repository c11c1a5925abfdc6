//! Percent-complete reporting shared by the renderer and uploader.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Callback receiving percent-complete values (0-100).
pub type PercentCallback = Arc<dyn Fn(u8) + Send + Sync + 'static>;

/// Forwards percent values to a callback, dropping anything that would move
/// backwards or repeat the last reported value.
pub struct MonotonicPercent {
    last: AtomicU8,
    reported_any: AtomicBool,
    callback: PercentCallback,
}

impl MonotonicPercent {
    pub fn new(callback: PercentCallback) -> Self {
        Self {
            last: AtomicU8::new(0),
            reported_any: AtomicBool::new(false),
            callback,
        }
    }

    /// Report `percent`; returns true if the callback was invoked.
    pub fn report(&self, percent: u8) -> bool {
        let percent = percent.min(100);
        let previous = self.last.fetch_max(percent, Ordering::SeqCst);
        let first = !self.reported_any.swap(true, Ordering::SeqCst);
        if percent > previous || (first && percent == previous) {
            (self.callback)(percent);
            true
        } else {
            false
        }
    }

    /// Highest value reported so far.
    pub fn current(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (PercentCallback, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (Arc::new(move |p| sink.lock().unwrap().push(p)), seen)
    }

    #[test]
    fn test_drops_regressions_and_repeats() {
        let (callback, seen) = recorder();
        let progress = MonotonicPercent::new(callback);

        for p in [0, 5, 5, 3, 20, 19, 100, 100] {
            progress.report(p);
        }

        assert_eq!(*seen.lock().unwrap(), vec![0, 5, 20, 100]);
        assert_eq!(progress.current(), 100);
    }

    #[test]
    fn test_clamps_above_hundred() {
        let (callback, seen) = recorder();
        let progress = MonotonicPercent::new(callback);
        progress.report(250);
        assert_eq!(*seen.lock().unwrap(), vec![100]);
    }
}
