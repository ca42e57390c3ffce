//! Core data types for the lobsim replay system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Price as quoted by the feed.
pub type Price = f64;

/// Quantity (shares/contracts). Level-I feeds report whole lots.
pub type Qty = u64;

/// Elapsed seconds since midnight of the session day.
pub type SecondsOfDay = u32;

/// Index of the fixed-width bucket containing the given second.
#[inline]
pub fn seconds_to_bucket(seconds: SecondsOfDay, width: u32) -> u32 {
    seconds / width
}

/// Order book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side.
    Bid,
    /// Sell side.
    Ask,
}

impl Side {
    /// Returns the opposite side.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Bid => "BID",
            Side::Ask => "ASK",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record type carried by a feed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// Best bid update.
    Bid,
    /// Best ask update.
    Ask,
    /// Trade print.
    Trade,
}

impl RecordKind {
    /// The side implied by a quote record. Trades carry no side.
    pub fn side(self) -> Option<Side> {
        match self {
            RecordKind::Bid => Some(Side::Bid),
            RecordKind::Ask => Some(Side::Ask),
            RecordKind::Trade => None,
        }
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BID" => Ok(RecordKind::Bid),
            "ASK" => Ok(RecordKind::Ask),
            "TRADE" => Ok(RecordKind::Trade),
            other => Err(format!("unknown record type {other:?}")),
        }
    }
}

/// One row of the historical top-of-book feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Row ordinal as written in the session file.
    pub row: u64,
    /// Timestamp in seconds of day.
    pub seconds: SecondsOfDay,
    /// Quoted or traded price.
    pub price: Price,
    /// Quoted or traded size.
    pub size: Qty,
    /// Record type.
    pub kind: RecordKind,
}

impl RawRecord {
    /// Copy of this record re-typed as a trade at the given price and size.
    pub fn as_trade(&self, price: Price, size: Qty) -> Self {
        Self {
            row: self.row,
            seconds: self.seconds,
            price,
            size,
            kind: RecordKind::Trade,
        }
    }
}

/// Lifecycle status carried by a book mutation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// A new price level appears.
    New,
    /// The resting quantity at an existing level is replaced.
    Replaced,
    /// Part of the resting quantity was traded.
    PartiallyFilled,
    /// The whole resting quantity was traded.
    Filled,
    /// The level was withdrawn.
    Canceled,
}

impl OrderStatus {
    /// Whether the status reports an execution.
    #[inline]
    pub fn is_fill(self) -> bool {
        matches!(self, OrderStatus::PartiallyFilled | OrderStatus::Filled)
    }
}

/// A normalized order book mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookCommand {
    /// Row ordinal of the record that produced the command.
    pub row: u64,
    /// Side the command applies to.
    pub side: Side,
    /// Price level.
    pub price: Price,
    /// Quantity affected (new level size, or traded/canceled quantity).
    pub qty: Qty,
    /// Status of the mutation.
    pub status: OrderStatus,
    /// Whether this is the aggressive leg of an execution.
    pub aggressor: bool,
}

impl BookCommand {
    /// Create a passive command.
    pub fn passive(row: u64, side: Side, price: Price, qty: Qty, status: OrderStatus) -> Self {
        Self {
            row,
            side,
            price,
            qty,
            status,
            aggressor: false,
        }
    }

    /// Create the aggressive leg of an execution. It never rests in the book.
    pub fn aggressive(row: u64, side: Side, price: Price, qty: Qty) -> Self {
        Self {
            row,
            side,
            price,
            qty,
            status: OrderStatus::Filled,
            aggressor: true,
        }
    }

    /// Whether this is an aggressive fill.
    #[inline]
    pub fn is_aggressive_fill(&self) -> bool {
        self.aggressor && self.status.is_fill()
    }
}

/// Best price and its resting quantity on one side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestQuote {
    pub price: Price,
    pub qty: Qty,
}

impl BestQuote {
    pub fn new(price: Price, qty: Qty) -> Self {
        Self { price, qty }
    }
}

/// Best bid and best ask snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TopOfBook {
    pub bid: Option<BestQuote>,
    pub ask: Option<BestQuote>,
}

impl TopOfBook {
    pub fn new(bid: Option<BestQuote>, ask: Option<BestQuote>) -> Self {
        Self { bid, ask }
    }

    /// Both sides have resting interest.
    #[inline]
    pub fn is_two_sided(&self) -> bool {
        self.bid.is_some() && self.ask.is_some()
    }

    /// Best bid is not strictly below best ask.
    pub fn is_crossed(&self) -> bool {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => b.price >= a.price,
            _ => false,
        }
    }

    /// Calculate mid price.
    pub fn mid(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some((b.price + a.price) / 2.0),
            _ => None,
        }
    }

    /// Calculate spread.
    pub fn spread(&self) -> Option<f64> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some(a.price - b.price),
            _ => None,
        }
    }
}

/// Snapshot of the cumulative session metrics taken when a bucket boundary
/// is crossed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    /// Bucket index (seconds of day divided by the bucket width).
    pub index: u32,
    /// First second of the bucket.
    pub start_seconds: SecondsOfDay,
    /// Cumulative order flow imbalance.
    pub ofi: f64,
    /// Cumulative quantity traded against resting bids.
    pub qty_traded_bid: Qty,
    /// Cumulative quantity traded against resting asks.
    pub qty_traded_ask: Qty,
    /// Mid price of the cached best quotes, if both sides were known.
    pub mid_price: Option<f64>,
}
