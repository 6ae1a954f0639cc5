//! Smoothed round-trip latency

/// Exponentially weighted moving average of latency samples
///
/// Each sample contributes a fifth: `new = previous * 0.8 + sample * 0.2`,
/// truncated to an integer. A zero estimate counts as "no sample yet", so the
/// first sample is taken as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyTracker {
    estimate: u64,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn estimate(&self) -> u64 {
        self.estimate
    }

    /// Fold in a sample and return the new estimate
    pub fn record(&mut self, sample: u64) -> u64 {
        self.estimate = if self.estimate == 0 {
            sample
        } else {
            // Integer form of prev*0.8 + sample*0.2, truncated.
            (self.estimate.saturating_mul(4).saturating_add(sample)) / 5
        };
        self.estimate
    }

    pub fn reset(&mut self) {
        self.estimate = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_is_taken_verbatim() {
        let mut tracker = LatencyTracker::new();
        assert_eq!(tracker.record(100), 100);
    }

    #[test]
    fn test_weighted_update() {
        let mut tracker = LatencyTracker::new();
        tracker.record(100);
        assert_eq!(tracker.record(50), 90);
        // 90*0.8 + 33*0.2 = 78.6
        assert_eq!(tracker.record(33), 78);
    }

    #[test]
    fn test_converges_monotonically() {
        let mut tracker = LatencyTracker::new();
        tracker.record(400);

        let mut previous = tracker.estimate();
        for _ in 0..100 {
            let next = tracker.record(50);
            assert!(next <= previous);
            assert!(next >= 50);
            previous = next;
        }
        assert_eq!(tracker.estimate(), 50);
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut tracker = LatencyTracker::new();
        tracker.record(300);
        tracker.reset();
        assert_eq!(tracker.estimate(), 0);
        assert_eq!(tracker.record(20), 20);
    }
}
