//! Session lifecycle.
//!
//! Every per-session counter lives in one [`SessionState`]; resetting a
//! session is a single reinitialization of that struct.

use lobsim_core::TopOfBook;
use lobsim_features::MetricsAccumulator;
use tracing::debug;

/// Where a replay stands with respect to its sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// A session is selected but no record has been read from it yet.
    Idle,
    /// Records are being read from the current session.
    Active,
    /// No sessions remain.
    Exhausted,
}

/// Counters owned by one session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Best quotes after the last step that left a two-sided book.
    pub quotes: TopOfBook,
    /// OFI, traded volume and buckets.
    pub metrics: MetricsAccumulator,
    /// Records consumed from the session.
    pub cursor: u64,
}

impl SessionState {
    pub fn new(bucket_seconds: u32) -> Self {
        Self {
            quotes: TopOfBook::default(),
            metrics: MetricsAccumulator::new(bucket_seconds),
            cursor: 0,
        }
    }
}

/// Session index, phase and the active session's counters.
#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    index: usize,
    phase: SessionPhase,
    state: SessionState,
    bucket_seconds: u32,
}

impl SessionLifecycle {
    /// Start at `index`, which is exhausted already when no such session exists.
    pub fn new(index: usize, session_count: usize, bucket_seconds: u32) -> Self {
        let phase = if index < session_count {
            SessionPhase::Idle
        } else {
            SessionPhase::Exhausted
        };
        Self {
            index,
            phase,
            state: SessionState::new(bucket_seconds),
            bucket_seconds,
        }
    }

    /// Index of the current session.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// The first record of the session was read.
    pub fn activate(&mut self) {
        if self.phase == SessionPhase::Idle {
            self.phase = SessionPhase::Active;
        }
    }

    /// Clear the session counters unless nothing was consumed since the last
    /// reset. Returns whether anything was cleared.
    pub fn reset(&mut self) -> bool {
        if self.state.cursor == 0 {
            return false;
        }
        debug!(session = self.index, cursor = self.state.cursor, "session reset");
        self.state = SessionState::new(self.bucket_seconds);
        true
    }

    /// Move past a session whose rows ran out.
    ///
    /// The counters are always reinitialized here, even for a session that
    /// produced no records.
    pub fn roll_over(&mut self, session_count: usize) -> SessionPhase {
        self.state = SessionState::new(self.bucket_seconds);
        self.index += 1;
        self.phase = if self.index < session_count {
            SessionPhase::Idle
        } else {
            SessionPhase::Exhausted
        };
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobsim_core::BestQuote;

    fn consume(lifecycle: &mut SessionLifecycle) {
        let state = lifecycle.state_mut();
        state.cursor += 3;
        state.quotes = TopOfBook::new(Some(BestQuote::new(10.0, 1)), Some(BestQuote::new(11.0, 1)));
    }

    #[test]
    fn test_phases() {
        let mut lifecycle = SessionLifecycle::new(0, 2, 10);
        assert_eq!(lifecycle.phase(), SessionPhase::Idle);

        lifecycle.activate();
        assert_eq!(lifecycle.phase(), SessionPhase::Active);

        assert_eq!(lifecycle.roll_over(2), SessionPhase::Idle);
        assert_eq!(lifecycle.index(), 1);
        assert_eq!(lifecycle.roll_over(2), SessionPhase::Exhausted);

        // Activation never leaves the terminal phase.
        lifecycle.activate();
        assert_eq!(lifecycle.phase(), SessionPhase::Exhausted);
    }

    #[test]
    fn test_start_past_end() {
        let lifecycle = SessionLifecycle::new(4, 2, 10);
        assert_eq!(lifecycle.phase(), SessionPhase::Exhausted);
    }

    #[test]
    fn test_reset_is_guarded() {
        let mut lifecycle = SessionLifecycle::new(0, 1, 10);
        assert!(!lifecycle.reset());

        consume(&mut lifecycle);
        assert!(lifecycle.reset());
        assert_eq!(lifecycle.state().cursor, 0);
        assert!(!lifecycle.state().quotes.is_two_sided());

        assert!(!lifecycle.reset());
    }

    #[test]
    fn test_roll_over_clears_unconditionally() {
        let mut lifecycle = SessionLifecycle::new(0, 3, 10);
        lifecycle.state_mut().quotes =
            TopOfBook::new(Some(BestQuote::new(10.0, 1)), Some(BestQuote::new(11.0, 1)));

        lifecycle.roll_over(3);
        assert!(!lifecycle.state().quotes.is_two_sided());
        assert_eq!(lifecycle.state().metrics.ofi(), 0.0);
    }
}
