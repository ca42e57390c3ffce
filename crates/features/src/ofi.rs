//! Order flow imbalance from best-quote changes.
//!
//! Each side contributes when its best (price, quantity) changes: a bid that
//! holds or improves adds its new quantity, a bid that holds or retreats
//! removes its old quantity. The ask side mirrors this with opposite signs.

use lobsim_core::{BestQuote, TopOfBook};

/// OFI contribution of one best-quote transition.
pub fn ofi_delta(prev_bid: BestQuote, prev_ask: BestQuote, bid: BestQuote, ask: BestQuote) -> f64 {
    let mut delta = 0.0;

    if bid != prev_bid {
        if bid.price >= prev_bid.price {
            delta += bid.qty as f64;
        }
        if bid.price <= prev_bid.price {
            delta -= prev_bid.qty as f64;
        }
    }

    if ask != prev_ask {
        if ask.price <= prev_ask.price {
            delta -= ask.qty as f64;
        }
        if ask.price >= prev_ask.price {
            delta += prev_ask.qty as f64;
        }
    }

    delta
}

/// OFI contribution between two top-of-book snapshots.
///
/// Returns `None` when the new snapshot is one-sided (the accumulator is left
/// alone) and `Some(0.0)` when there is no two-sided baseline yet.
pub fn ofi_between(prev: &TopOfBook, next: &TopOfBook) -> Option<f64> {
    let (bid, ask) = (next.bid?, next.ask?);
    match (prev.bid, prev.ask) {
        (Some(prev_bid), Some(prev_ask)) => Some(ofi_delta(prev_bid, prev_ask, bid, ask)),
        _ => Some(0.0),
    }
}
