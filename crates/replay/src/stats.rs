//! Replay run statistics.

use serde::{Deserialize, Serialize};

/// Counters over the lifetime of a replay engine. Session resets leave them
/// alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStats {
    /// Successful `Emitted` steps.
    pub steps: u64,
    /// Records consumed, excluding correction passes.
    pub records: u64,
    /// Commands applied to the book.
    pub commands: u64,
    /// Crossed-quote corrections.
    pub corrections: u64,
    /// Sessions whose rows ran out.
    pub sessions_completed: u64,
    /// Aggressive fill commands applied.
    pub aggressive_fills: u64,
    /// Steps that moved the cumulative OFI.
    pub ofi_updates: u64,
}

impl ReplayStats {
    /// Share of steps that were crossed-quote corrections.
    pub fn correction_rate(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.corrections as f64 / self.steps as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correction_rate() {
        assert_eq!(ReplayStats::default().correction_rate(), 0.0);

        let stats = ReplayStats {
            steps: 8,
            corrections: 2,
            ..Default::default()
        };
        assert!((stats.correction_rate() - 0.25).abs() < 1e-10);
    }
}
