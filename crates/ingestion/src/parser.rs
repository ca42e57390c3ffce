//! Row parsing for Level-I session files.
//!
//! Maps a CSV row onto a [`RawRecord`] using the header names configured in
//! [`FeedLayout`]. Timestamps keep only their time-of-day part.

use chrono::{NaiveTime, Timelike};
use lobsim_core::config::FeedLayout;
use lobsim_core::{Error, Qty, RawRecord, RecordKind, Result, SecondsOfDay};

/// Parse the time-of-day embedded in a date-time string into seconds of day.
///
/// Accepts `HH:MM:SS`, with or without a leading date and fractional seconds.
/// Fractions are truncated.
pub fn parse_seconds_of_day(value: &str) -> Option<SecondsOfDay> {
    let time_part = value.split_whitespace().last()?;
    let time = time_part.parse::<NaiveTime>().ok()?;
    Some(time.num_seconds_from_midnight())
}

/// Parse a whole-lot quantity. Exports sometimes write sizes as `300.0`.
fn parse_qty(value: &str) -> Option<Qty> {
    let value = value.trim();
    if let Ok(qty) = value.parse::<Qty>() {
        return Some(qty);
    }
    let float = value.parse::<f64>().ok()?;
    if float >= 0.0 && float.fract() == 0.0 {
        Some(float as Qty)
    } else {
        None
    }
}

/// Column positions resolved from a session file header.
#[derive(Debug, Clone)]
pub struct RowParser {
    row_idx: Option<usize>,
    date_idx: usize,
    type_idx: usize,
    price_idx: usize,
    size_idx: usize,
    /// Fallback ordinal for files without a row column.
    next_row: u64,
}

impl RowParser {
    /// Resolve the configured columns against a header row.
    pub fn from_headers(headers: &csv::StringRecord, layout: &FeedLayout) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| Error::parse(0, format!("missing column {name:?}")))
        };

        Ok(Self {
            row_idx: find(layout.row_column.as_str()),
            date_idx: require(layout.date_column.as_str())?,
            type_idx: require(layout.type_column.as_str())?,
            price_idx: require(layout.price_column.as_str())?,
            size_idx: require(layout.size_column.as_str())?,
            next_row: 0,
        })
    }

    /// Parse one data row.
    pub fn parse(&mut self, record: &csv::StringRecord) -> Result<RawRecord> {
        let fallback_row = self.next_row;
        self.next_row += 1;

        let field = |idx: usize, name: &str| {
            record
                .get(idx)
                .ok_or_else(|| Error::parse(fallback_row, format!("missing {name} field")))
        };

        let row = match self.row_idx {
            Some(idx) => {
                let raw = field(idx, "row")?;
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| Error::parse(fallback_row, format!("bad row ordinal {raw:?}")))?
            }
            None => fallback_row,
        };

        let date = field(self.date_idx, "date")?;
        let seconds = parse_seconds_of_day(date)
            .ok_or_else(|| Error::parse(row, format!("bad timestamp {date:?}")))?;

        let kind = field(self.type_idx, "type")?
            .parse::<RecordKind>()
            .map_err(|e| Error::parse(row, e))?;

        let raw_price = field(self.price_idx, "price")?;
        let price = raw_price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite())
            .ok_or_else(|| Error::parse(row, format!("bad price {raw_price:?}")))?;

        let raw_size = field(self.size_idx, "size")?;
        let size =
            parse_qty(raw_size).ok_or_else(|| Error::parse(row, format!("bad size {raw_size:?}")))?;

        Ok(RawRecord {
            row,
            seconds,
            price,
            size,
            kind,
        })
    }
}
