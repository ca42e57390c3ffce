//! Metric computation for the lobsim replay system.
//!
//! This crate handles:
//! - Order flow imbalance from best-quote transitions
//! - Traded volume by the side that was hit
//! - Fixed-width time bucket snapshots
//! - The per-session accumulator combining them

pub mod accumulator;
pub mod bucket;
pub mod ofi;
pub mod volume;

pub use accumulator::{MetricsAccumulator, StepMetrics};
pub use bucket::BucketClock;
pub use ofi::{ofi_between, ofi_delta};
pub use volume::TradedVolume;
