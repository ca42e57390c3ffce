//! Fixed-width time buckets over seconds of day.
//!
//! When a step lands in a different bucket than the last closed one, the
//! current cumulative values are snapshotted as that bucket. Snapshots hold
//! running totals, not per-bucket deltas.

use crate::volume::TradedVolume;
use lobsim_core::{seconds_to_bucket, Bucket, SecondsOfDay};

/// Tracks bucket boundaries and keeps the closed snapshots.
#[derive(Debug, Clone)]
pub struct BucketClock {
    /// Bucket width in seconds.
    width: u32,
    /// Closed buckets in the order they were closed.
    history: Vec<Bucket>,
}

impl BucketClock {
    /// Create a clock with the given bucket width.
    ///
    /// # Panics
    /// Panics if `width` is zero.
    pub fn new(width: u32) -> Self {
        assert!(width > 0, "bucket width must be positive");
        Self {
            width,
            history: Vec::new(),
        }
    }

    /// Observe the current time and cumulative values. Returns the bucket
    /// closed by this observation, if any.
    pub fn observe(
        &mut self,
        seconds: SecondsOfDay,
        ofi: f64,
        volume: &TradedVolume,
        mid_price: Option<f64>,
    ) -> Option<&Bucket> {
        let index = seconds_to_bucket(seconds, self.width);
        if self.last_index() == Some(index) {
            return None;
        }

        self.history.push(Bucket {
            index,
            start_seconds: index * self.width,
            ofi,
            qty_traded_bid: volume.at_bid,
            qty_traded_ask: volume.at_ask,
            mid_price,
        });
        self.history.last()
    }

    /// Index of the last closed bucket.
    pub fn last_index(&self) -> Option<u32> {
        self.history.last().map(|b| b.index)
    }

    /// Last closed bucket.
    pub fn last(&self) -> Option<&Bucket> {
        self.history.last()
    }

    /// All closed buckets.
    pub fn history(&self) -> &[Bucket] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(at_bid: u64, at_ask: u64) -> TradedVolume {
        TradedVolume { at_bid, at_ask }
    }

    #[test]
    fn test_first_observation_closes() {
        let mut clock = BucketClock::new(10);
        let bucket = clock.observe(36_003, 5.0, &volume(1, 2), Some(100.5)).cloned().unwrap();

        assert_eq!(bucket.index, 3600);
        assert_eq!(bucket.start_seconds, 36_000);
        assert_eq!(bucket.qty_traded_bid, 1);
        assert_eq!(bucket.qty_traded_ask, 2);
        assert_eq!(bucket.mid_price, Some(100.5));
    }

    #[test]
    fn test_closed_once_per_boundary() {
        let mut clock = BucketClock::new(10);
        assert!(clock.observe(36_000, 0.0, &volume(0, 0), None).is_some());
        assert!(clock.observe(36_004, 1.0, &volume(0, 0), None).is_none());
        assert!(clock.observe(36_009, 2.0, &volume(0, 0), None).is_none());

        let bucket = clock.observe(36_011, 3.0, &volume(4, 0), None).cloned().unwrap();
        assert_eq!(bucket.index, 3601);
        assert!((bucket.ofi - 3.0).abs() < 1e-10);

        assert!(clock.observe(36_019, 4.0, &volume(4, 0), None).is_none());
        assert_eq!(clock.history().len(), 2);
    }

    #[test]
    fn test_skipped_boundary_still_closes() {
        let mut clock = BucketClock::new(10);
        clock.observe(36_008, 0.0, &volume(0, 0), None);
        // No row fell exactly on 36_010; the next row still closes a bucket.
        let bucket = clock.observe(36_027, 9.0, &volume(0, 0), None).cloned().unwrap();
        assert_eq!(bucket.index, 3602);
        assert_eq!(clock.history().len(), 2);
    }
}
