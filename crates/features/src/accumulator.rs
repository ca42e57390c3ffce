//! Metrics accumulator.
//!
//! Combines the OFI rule, traded-volume counters and the bucket clock into
//! the per-session metric state updated once per replay step.

use crate::bucket::BucketClock;
use crate::ofi::ofi_between;
use crate::volume::TradedVolume;
use lobsim_core::{BookCommand, Bucket, Qty, SecondsOfDay, TopOfBook};
use tracing::trace;

/// What a single step changed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepMetrics {
    /// OFI contribution, if the book was two-sided after the step.
    pub ofi_delta: Option<f64>,
    /// Index of the bucket closed by this step.
    pub closed_bucket: Option<u32>,
}

/// Running OFI, traded volume and bucket snapshots for one session.
#[derive(Debug, Clone)]
pub struct MetricsAccumulator {
    ofi: f64,
    volume: TradedVolume,
    buckets: BucketClock,
}

impl MetricsAccumulator {
    /// Create an accumulator with the given bucket width in seconds.
    pub fn new(bucket_seconds: u32) -> Self {
        Self {
            ofi: 0.0,
            volume: TradedVolume::default(),
            buckets: BucketClock::new(bucket_seconds),
        }
    }

    /// Update after a step's commands were applied.
    ///
    /// `cached` is the best-quote cache from before the step, `book_top` the
    /// book's best quotes after it. The cache is only replaced by two-sided
    /// snapshots, so the bucket mid falls back to it for one-sided books.
    pub fn on_step(
        &mut self,
        cached: &TopOfBook,
        book_top: &TopOfBook,
        commands: &[BookCommand],
        seconds: SecondsOfDay,
    ) -> StepMetrics {
        for command in commands {
            self.volume.record(command);
        }

        let ofi_delta = ofi_between(cached, book_top);
        if let Some(delta) = ofi_delta {
            self.ofi += delta;
        }

        let quotes = if book_top.is_two_sided() { book_top } else { cached };
        let closed_bucket = self
            .buckets
            .observe(seconds, self.ofi, &self.volume, quotes.mid())
            .map(|bucket| bucket.index);
        trace!(seconds, ofi = self.ofi, ?closed_bucket, "metrics updated");

        StepMetrics {
            ofi_delta,
            closed_bucket,
        }
    }

    /// Cumulative order flow imbalance.
    pub fn ofi(&self) -> f64 {
        self.ofi
    }

    /// Quantity traded against resting bids.
    pub fn qty_traded_at_bid(&self) -> Qty {
        self.volume.at_bid
    }

    /// Quantity traded against resting asks.
    pub fn qty_traded_at_ask(&self) -> Qty {
        self.volume.at_ask
    }

    /// Last closed bucket.
    pub fn last_bucket(&self) -> Option<&Bucket> {
        self.buckets.last()
    }

    /// All closed buckets.
    pub fn buckets(&self) -> &[Bucket] {
        self.buckets.history()
    }
}
