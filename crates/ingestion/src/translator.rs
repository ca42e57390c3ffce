//! Translation of Level-I feed rows into book mutation commands.
//!
//! Quote rows move one side's best level; they never touch the opposite
//! side, which is how a replayed Level-I tape can leave the book crossed.
//! Trade rows fill resting interest on the side that was hit, inferred from
//! the trade price relative to the current best quotes when no hint is given.

use lobsim_core::{BookCommand, BookView, OrderStatus, Price, Qty, RawRecord, RecordKind, Side};
use tracing::trace;

/// Maps a raw feed row onto the book commands it implies.
pub trait RowTranslator {
    /// Translate one record.
    ///
    /// `row` is the ordinal stamped into the commands. `side_hint`
    /// names the resting side hit by a trade; it is ignored for quotes.
    fn translate(
        &self,
        row: u64,
        record: &RawRecord,
        side_hint: Option<Side>,
        book: &dyn BookView,
    ) -> Vec<BookCommand>;
}

/// Translator for top-of-book (Level-I) quote and trade rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevelOneTranslator;

impl LevelOneTranslator {
    fn translate_quote(
        row: u64,
        side: Side,
        price: Price,
        size: Qty,
        book: &dyn BookView,
    ) -> Vec<BookCommand> {
        // A new best quote means every more aggressive level was pulled.
        let mut commands: Vec<BookCommand> = book
            .levels_better_than(side, price)
            .into_iter()
            .map(|level| BookCommand::passive(row, side, level.price, level.qty, OrderStatus::Canceled))
            .collect();

        match (book.level_qty(side, price), size) {
            (None, 0) => {}
            (None, size) => commands.push(BookCommand::passive(row, side, price, size, OrderStatus::New)),
            (Some(resting), 0) => {
                commands.push(BookCommand::passive(row, side, price, resting, OrderStatus::Canceled))
            }
            (Some(resting), size) if resting != size => {
                commands.push(BookCommand::passive(row, side, price, size, OrderStatus::Replaced))
            }
            (Some(_), _) => {}
        }

        commands
    }

    fn translate_trade(
        row: u64,
        price: Price,
        size: Qty,
        side_hint: Option<Side>,
        book: &dyn BookView,
    ) -> Vec<BookCommand> {
        let Some(side) = side_hint.or_else(|| infer_resting_side(price, book)) else {
            trace!(row, price, "trade with an empty book");
            return Vec::new();
        };

        let (level_price, resting) = match book.level_qty(side, price) {
            Some(qty) => (price, qty),
            None => {
                let Some(best) = book.best_of(side) else {
                    return Vec::new();
                };
                let reaches_best = match side {
                    Side::Bid => price <= best.price,
                    Side::Ask => price >= best.price,
                };
                if !reaches_best {
                    trace!(row, price, %side, "trade does not reach resting interest");
                    return Vec::new();
                }
                (best.price, best.qty)
            }
        };

        let fill = size.min(resting);
        if fill == 0 {
            return Vec::new();
        }
        let status = if fill == resting {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };

        vec![
            BookCommand::aggressive(row, side.opposite(), level_price, fill),
            BookCommand::passive(row, side, level_price, fill, status),
        ]
    }
}

impl RowTranslator for LevelOneTranslator {
    fn translate(
        &self,
        row: u64,
        record: &RawRecord,
        side_hint: Option<Side>,
        book: &dyn BookView,
    ) -> Vec<BookCommand> {
        match record.kind {
            RecordKind::Bid => Self::translate_quote(row, Side::Bid, record.price, record.size, book),
            RecordKind::Ask => Self::translate_quote(row, Side::Ask, record.price, record.size, book),
            RecordKind::Trade => {
                Self::translate_trade(row, record.price, record.size, side_hint, book)
            }
        }
    }
}

/// Infer which resting side a trade hit from its price.
///
/// At or above the best ask the buyer was aggressive; at or below the best
/// bid the seller was. Prints inside the spread go to the nearer side, ties
/// to the ask.
pub fn infer_resting_side(price: Price, book: &dyn BookView) -> Option<Side> {
    let bid = book.best_of(Side::Bid);
    let ask = book.best_of(Side::Ask);

    match (bid, ask) {
        (_, Some(a)) if price >= a.price => Some(Side::Ask),
        (Some(b), _) if price <= b.price => Some(Side::Bid),
        (Some(b), Some(a)) => {
            if a.price - price <= price - b.price {
                Some(Side::Ask)
            } else {
                Some(Side::Bid)
            }
        }
        (Some(_), None) => Some(Side::Bid),
        (None, Some(_)) => Some(Side::Ask),
        (None, None) => None,
    }
}
