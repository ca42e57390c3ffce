//! Traded quantity by the side that was hit.

use lobsim_core::{BookCommand, Qty, Side};
use serde::{Deserialize, Serialize};

/// Cumulative traded quantity per resting side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradedVolume {
    /// Quantity traded against resting bids (sellers aggressive).
    pub at_bid: Qty,
    /// Quantity traded against resting asks (buyers aggressive).
    pub at_ask: Qty,
}

impl TradedVolume {
    /// Count an applied command. Only aggressive fills are counted, on the
    /// side opposite the aggressor.
    pub fn record(&mut self, command: &BookCommand) {
        if !command.is_aggressive_fill() {
            return;
        }
        match command.side {
            Side::Bid => self.at_ask += command.qty,
            Side::Ask => self.at_bid += command.qty,
        }
    }

    /// Total traded quantity.
    pub fn total(&self) -> Qty {
        self.at_bid + self.at_ask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobsim_core::OrderStatus;

    #[test]
    fn test_aggressive_bid_counts_at_ask() {
        let mut volume = TradedVolume::default();
        volume.record(&BookCommand::aggressive(1, Side::Bid, 102.0, 10));
        volume.record(&BookCommand::passive(1, Side::Ask, 102.0, 10, OrderStatus::PartiallyFilled));

        assert_eq!(volume.at_ask, 10);
        assert_eq!(volume.at_bid, 0);
    }

    #[test]
    fn test_aggressive_ask_counts_at_bid() {
        let mut volume = TradedVolume::default();
        volume.record(&BookCommand::aggressive(1, Side::Ask, 100.0, 7));
        volume.record(&BookCommand::aggressive(2, Side::Ask, 100.0, 3));

        assert_eq!(volume.at_bid, 10);
        assert_eq!(volume.total(), 10);
    }

    #[test]
    fn test_non_fills_ignored() {
        let mut volume = TradedVolume::default();
        let mut cmd = BookCommand::aggressive(1, Side::Bid, 102.0, 10);
        cmd.status = OrderStatus::Canceled;
        volume.record(&cmd);
        volume.record(&BookCommand::passive(1, Side::Bid, 100.0, 5, OrderStatus::New));

        assert_eq!(volume, TradedVolume::default());
    }
}
