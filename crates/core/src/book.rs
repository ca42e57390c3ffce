//! The narrow interface through which the replay system reads and mutates
//! an order book.

use crate::error::Result;
use crate::types::{BestQuote, BookCommand, Price, Qty, Side, TopOfBook};

/// Read-only view of a price-indexed order book.
pub trait BookView {
    /// Best price and resting quantity on a side.
    fn best_of(&self, side: Side) -> Option<BestQuote>;

    /// Number of price levels on a side.
    fn count(&self, side: Side) -> usize;

    /// Resting quantity at an exact price level.
    fn level_qty(&self, side: Side, price: Price) -> Option<Qty>;

    /// Levels strictly more aggressive than `price`, best first.
    fn levels_better_than(&self, side: Side, price: Price) -> Vec<BestQuote>;

    /// Best bid and best ask together.
    fn top_of_book(&self) -> TopOfBook {
        TopOfBook::new(self.best_of(Side::Bid), self.best_of(Side::Ask))
    }
}

/// An order book that accepts mutation commands.
pub trait BookState: BookView {
    /// Apply a single mutation command.
    ///
    /// Returns `Error::InvariantViolation` when the command requires resting
    /// interest that is not there.
    fn apply(&mut self, command: &BookCommand) -> Result<()>;
}
