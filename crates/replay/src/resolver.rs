//! Crossed-quote resolution.
//!
//! Level-I quotes move one side at a time, so replaying them can leave the
//! best bid at or through the best ask. Such a state is treated as an implied
//! trade of `min(bid qty, ask qty)` between the two best levels. The record
//! that was about to be processed is kept back and translated normally on the
//! next step, after the correction has been applied.

use lobsim_core::{BookCommand, BookView, RawRecord, Side, TopOfBook};
use lobsim_ingestion::RowTranslator;
use tracing::debug;

/// A synthesized trade that uncrosses the book.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// Quantity of each leg.
    pub qty: u64,
    /// Fill commands: the ask leg first, then the bid leg.
    pub commands: Vec<BookCommand>,
}

/// Crossed-quote detector and trade synthesizer.
#[derive(Debug, Clone, Copy)]
pub struct CrossedQuoteResolver {
    /// Records with a row ordinal at or below this never trigger a correction.
    warmup_rows: u64,
}

impl CrossedQuoteResolver {
    pub fn new(warmup_rows: u64) -> Self {
        Self { warmup_rows }
    }

    /// Check the cached quotes before `record` is processed.
    ///
    /// Returns `None` when no correction applies: the record is still in the
    /// warm-up window, one side of the book is empty, or the quotes are not
    /// crossed.
    pub fn resolve<T: RowTranslator + ?Sized>(
        &self,
        record: &RawRecord,
        quotes: &TopOfBook,
        book: &dyn BookView,
        translator: &T,
    ) -> Option<Correction> {
        if record.row <= self.warmup_rows {
            return None;
        }
        if book.count(Side::Bid) == 0 || book.count(Side::Ask) == 0 {
            return None;
        }
        if !quotes.is_crossed() {
            return None;
        }
        let (bid, ask) = (quotes.bid?, quotes.ask?);
        let qty = bid.qty.min(ask.qty);

        let mut commands =
            translator.translate(record.row, &record.as_trade(ask.price, qty), Some(Side::Ask), book);
        commands.extend(translator.translate(
            record.row,
            &record.as_trade(bid.price, qty),
            Some(Side::Bid),
            book,
        ));

        if commands.is_empty() {
            // Nothing rests at the cached levels; resolving would never finish.
            return None;
        }

        debug!(
            row = record.row,
            bid = bid.price,
            ask = ask.price,
            qty,
            "crossed quotes, synthesizing trade"
        );
        Some(Correction { qty, commands })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobsim_book::LimitOrderBook;
    use lobsim_core::{BookState, OrderStatus, RecordKind};
    use lobsim_ingestion::LevelOneTranslator;

    fn record(row: u64) -> RawRecord {
        RawRecord {
            row,
            seconds: 36_000,
            price: 100.5,
            size: 10,
            kind: RecordKind::Bid,
        }
    }

    fn crossed_book() -> LimitOrderBook {
        let mut book = LimitOrderBook::new("TEST");
        book.apply(&BookCommand::passive(0, Side::Bid, 101.0, 50, OrderStatus::New)).unwrap();
        book.apply(&BookCommand::passive(0, Side::Ask, 100.0, 30, OrderStatus::New)).unwrap();
        book
    }

    #[test]
    fn test_crossed_book_synthesizes_trade() {
        let book = crossed_book();
        let resolver = CrossedQuoteResolver::new(5);

        let correction = resolver
            .resolve(&record(6), &book.top_of_book(), &book, &LevelOneTranslator)
            .unwrap();

        assert_eq!(correction.qty, 30);
        let passive: Vec<_> = correction.commands.iter().filter(|c| !c.aggressor).collect();
        assert_eq!(passive.len(), 2);
        assert_eq!(passive[0].side, Side::Ask);
        assert!((passive[0].price - 100.0).abs() < 1e-10);
        assert_eq!(passive[0].status, OrderStatus::Filled);
        assert_eq!(passive[1].side, Side::Bid);
        assert!((passive[1].price - 101.0).abs() < 1e-10);
        assert_eq!(passive[1].status, OrderStatus::PartiallyFilled);
        assert!(passive.iter().all(|c| c.qty == 30));
    }

    #[test]
    fn test_warmup_rows_are_ignored() {
        let book = crossed_book();
        let resolver = CrossedQuoteResolver::new(5);

        for row in 0..=5 {
            assert!(resolver
                .resolve(&record(row), &book.top_of_book(), &book, &LevelOneTranslator)
                .is_none());
        }
    }

    #[test]
    fn test_uncrossed_or_one_sided() {
        let resolver = CrossedQuoteResolver::new(5);

        let mut book = LimitOrderBook::new("TEST");
        book.apply(&BookCommand::passive(0, Side::Bid, 99.0, 50, OrderStatus::New)).unwrap();
        assert!(resolver
            .resolve(&record(10), &book.top_of_book(), &book, &LevelOneTranslator)
            .is_none());

        book.apply(&BookCommand::passive(0, Side::Ask, 100.0, 30, OrderStatus::New)).unwrap();
        assert!(resolver
            .resolve(&record(10), &book.top_of_book(), &book, &LevelOneTranslator)
            .is_none());
    }

    #[test]
    fn test_locked_book_counts_as_crossed() {
        let mut book = LimitOrderBook::new("TEST");
        book.apply(&BookCommand::passive(0, Side::Bid, 100.0, 20, OrderStatus::New)).unwrap();
        book.apply(&BookCommand::passive(0, Side::Ask, 100.0, 20, OrderStatus::New)).unwrap();

        let correction = CrossedQuoteResolver::new(5)
            .resolve(&record(8), &book.top_of_book(), &book, &LevelOneTranslator)
            .unwrap();
        assert_eq!(correction.qty, 20);
    }
}
