//! Price-level limit order book.
//!
//! Level-I data carries no order identity, so each side is a sorted map from
//! price to aggregate resting quantity. Aggressive legs of executions never
//! rest; only the passive leg changes the book.

use lobsim_core::{
    BestQuote, BookCommand, BookState, BookView, Error, OrderStatus, Price, Qty, Result, Side,
};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use tracing::trace;

type Levels = BTreeMap<OrderedFloat<Price>, Qty>;

/// Limit order book for a single instrument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitOrderBook {
    symbol: String,
    /// Ascending; best bid is the last key.
    bids: Levels,
    /// Ascending; best ask is the first key.
    asks: Levels,
    /// Commands applied since creation.
    applied: u64,
}

impl LimitOrderBook {
    /// Create an empty book.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Number of commands applied to this book.
    pub fn applied_count(&self) -> u64 {
        self.applied
    }

    fn levels(&self, side: Side) -> &Levels {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn levels_mut(&mut self, side: Side) -> &mut Levels {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Up to `n` levels of one side, best first.
    pub fn depth(&self, side: Side, n: usize) -> Vec<BestQuote> {
        let to_quote = |(price, qty): (&OrderedFloat<Price>, &Qty)| BestQuote::new(price.0, *qty);
        match side {
            Side::Bid => self.bids.iter().rev().take(n).map(to_quote).collect(),
            Side::Ask => self.asks.iter().take(n).map(to_quote).collect(),
        }
    }

    /// Total resting quantity on a side.
    pub fn total_qty(&self, side: Side) -> Qty {
        self.levels(side).values().sum()
    }

    fn fill(&mut self, command: &BookCommand) -> Result<()> {
        let key = OrderedFloat(command.price);
        let levels = self.levels_mut(command.side);
        let resting = levels.get(&key).copied().ok_or_else(|| {
            Error::invariant(format!(
                "fill of {} at {} {} with no resting interest",
                command.qty, command.side, command.price
            ))
        })?;

        if command.qty > resting {
            return Err(Error::invariant(format!(
                "fill of {} at {} {} exceeds resting {}",
                command.qty, command.side, command.price, resting
            )));
        }

        let remaining = resting - command.qty;
        if remaining == 0 {
            levels.remove(&key);
        } else {
            levels.insert(key, remaining);
        }
        Ok(())
    }
}

impl BookView for LimitOrderBook {
    fn best_of(&self, side: Side) -> Option<BestQuote> {
        let level = match side {
            Side::Bid => self.bids.iter().next_back(),
            Side::Ask => self.asks.iter().next(),
        };
        level.map(|(price, qty)| BestQuote::new(price.0, *qty))
    }

    fn count(&self, side: Side) -> usize {
        self.levels(side).len()
    }

    fn level_qty(&self, side: Side, price: Price) -> Option<Qty> {
        self.levels(side).get(&OrderedFloat(price)).copied()
    }

    fn levels_better_than(&self, side: Side, price: Price) -> Vec<BestQuote> {
        let to_quote = |(p, qty): (&OrderedFloat<Price>, &Qty)| BestQuote::new(p.0, *qty);
        let key = OrderedFloat(price);
        match side {
            Side::Bid => self
                .bids
                .range((std::ops::Bound::Excluded(key), std::ops::Bound::Unbounded))
                .rev()
                .map(to_quote)
                .collect(),
            Side::Ask => self.asks.range(..key).map(to_quote).collect(),
        }
    }
}

impl BookState for LimitOrderBook {
    fn apply(&mut self, command: &BookCommand) -> Result<()> {
        trace!(symbol = %self.symbol, ?command, "apply");

        if command.aggressor {
            // Aggressive legs are bookkeeping only.
            self.applied += 1;
            return Ok(());
        }

        let key = OrderedFloat(command.price);
        match command.status {
            OrderStatus::New | OrderStatus::Replaced => {
                if command.qty == 0 {
                    self.levels_mut(command.side).remove(&key);
                } else {
                    self.levels_mut(command.side).insert(key, command.qty);
                }
            }
            OrderStatus::Canceled => {
                if self.levels_mut(command.side).remove(&key).is_none() {
                    return Err(Error::invariant(format!(
                        "cancel at {} {} with no resting interest",
                        command.side, command.price
                    )));
                }
            }
            OrderStatus::PartiallyFilled | OrderStatus::Filled => self.fill(command)?,
        }

        self.applied += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_level(side: Side, price: f64, qty: u64) -> BookCommand {
        BookCommand::passive(0, side, price, qty, OrderStatus::New)
    }

    fn seeded() -> LimitOrderBook {
        let mut book = LimitOrderBook::new("TEST");
        book.apply(&new_level(Side::Bid, 99.0, 10)).unwrap();
        book.apply(&new_level(Side::Bid, 100.0, 50)).unwrap();
        book.apply(&new_level(Side::Ask, 102.0, 30)).unwrap();
        book.apply(&new_level(Side::Ask, 103.0, 40)).unwrap();
        book
    }

    #[test]
    fn test_best_prices() {
        let book = seeded();
        assert_eq!(book.best_of(Side::Bid), Some(BestQuote::new(100.0, 50)));
        assert_eq!(book.best_of(Side::Ask), Some(BestQuote::new(102.0, 30)));
        assert_eq!(book.count(Side::Bid), 2);
        assert_eq!(book.count(Side::Ask), 2);
        assert_eq!(book.total_qty(Side::Ask), 70);
    }

    #[test]
    fn test_empty_book() {
        let book = LimitOrderBook::new("TEST");
        assert_eq!(book.best_of(Side::Bid), None);
        assert!(!book.top_of_book().is_two_sided());
    }

    #[test]
    fn test_depth_best_first() {
        let book = seeded();
        let bids = book.depth(Side::Bid, 5);
        assert_eq!(bids.len(), 2);
        assert!((bids[0].price - 100.0).abs() < 1e-10);
        assert!((bids[1].price - 99.0).abs() < 1e-10);

        let asks = book.depth(Side::Ask, 1);
        assert_eq!(asks, vec![BestQuote::new(102.0, 30)]);
    }

    #[test]
    fn test_levels_better_than() {
        let book = seeded();
        let better_bids = book.levels_better_than(Side::Bid, 99.0);
        assert_eq!(better_bids, vec![BestQuote::new(100.0, 50)]);

        let better_asks = book.levels_better_than(Side::Ask, 103.5);
        assert_eq!(better_asks.len(), 2);
        assert!((better_asks[0].price - 102.0).abs() < 1e-10);

        assert!(book.levels_better_than(Side::Ask, 102.0).is_empty());
    }

    #[test]
    fn test_replace_and_cancel() {
        let mut book = seeded();
        book.apply(&BookCommand::passive(1, Side::Bid, 100.0, 70, OrderStatus::Replaced))
            .unwrap();
        assert_eq!(book.level_qty(Side::Bid, 100.0), Some(70));

        book.apply(&BookCommand::passive(2, Side::Bid, 100.0, 70, OrderStatus::Canceled))
            .unwrap();
        assert_eq!(book.best_of(Side::Bid), Some(BestQuote::new(99.0, 10)));
    }

    #[test]
    fn test_partial_and_full_fill() {
        let mut book = seeded();
        book.apply(&BookCommand::passive(1, Side::Ask, 102.0, 10, OrderStatus::PartiallyFilled))
            .unwrap();
        assert_eq!(book.level_qty(Side::Ask, 102.0), Some(20));

        book.apply(&BookCommand::passive(2, Side::Ask, 102.0, 20, OrderStatus::Filled))
            .unwrap();
        assert_eq!(book.level_qty(Side::Ask, 102.0), None);
        assert_eq!(book.best_of(Side::Ask), Some(BestQuote::new(103.0, 40)));
    }

    #[test]
    fn test_aggressive_leg_does_not_rest() {
        let mut book = seeded();
        let before = book.clone();
        book.apply(&BookCommand::aggressive(1, Side::Bid, 102.0, 10)).unwrap();

        assert_eq!(book.best_of(Side::Bid), before.best_of(Side::Bid));
        assert_eq!(book.best_of(Side::Ask), before.best_of(Side::Ask));
        assert_eq!(book.applied_count(), before.applied_count() + 1);
    }

    #[test]
    fn test_fill_without_resting_interest() {
        let mut book = seeded();
        let err = book
            .apply(&BookCommand::passive(1, Side::Bid, 101.0, 5, OrderStatus::Filled))
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));

        let err = book
            .apply(&BookCommand::passive(1, Side::Bid, 100.0, 51, OrderStatus::PartiallyFilled))
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
        // Failed fills leave the level intact.
        assert_eq!(book.level_qty(Side::Bid, 100.0), Some(50));
    }

    #[test]
    fn test_cancel_missing_level() {
        let mut book = seeded();
        let err = book
            .apply(&BookCommand::passive(1, Side::Ask, 110.0, 5, OrderStatus::Canceled))
            .unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }
}
