//! Step-driven Level-I market data replay.
//!
//! This crate provides:
//! - The replay engine and its `StepResult` protocol
//! - Crossed-quote resolution
//! - Session lifecycle and per-session counters
//! - Run statistics

pub mod engine;
pub mod resolver;
pub mod session;
pub mod stats;

pub use engine::{OrderMatching, ReplayEngine, StepResult};
pub use resolver::{Correction, CrossedQuoteResolver};
pub use session::{SessionLifecycle, SessionPhase, SessionState};
pub use stats::ReplayStats;
