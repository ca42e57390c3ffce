//! Configuration structures for the lobsim replay system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for a replay run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Instrument configuration.
    pub instrument: InstrumentConfig,
    /// Replay engine configuration.
    pub engine: EngineConfig,
    /// Column layout of the session files.
    pub feed: FeedLayout,
}

impl ReplayConfig {
    /// Parse a configuration from JSON. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check values that would make the replay meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.engine.bucket_seconds == 0 {
            return Err(Error::config("bucket_seconds must be positive"));
        }
        for (name, column) in [
            ("date_column", &self.feed.date_column),
            ("type_column", &self.feed.type_column),
            ("price_column", &self.feed.price_column),
            ("size_column", &self.feed.size_column),
        ] {
            if column.is_empty() {
                return Err(Error::config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

/// Instrument-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Instrument symbol (e.g., "PETR4").
    pub symbol: String,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            symbol: "PETR4".to_string(),
        }
    }
}

/// Replay engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows with an ordinal at or below this value never trigger crossed-quote
    /// correction while the book is being seeded.
    pub warmup_rows: u64,
    /// Width of the metric buckets in seconds.
    pub bucket_seconds: u32,
    /// Index of the first session to replay.
    pub start_session: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warmup_rows: 5,
            bucket_seconds: 10,
            start_session: 0,
        }
    }
}

/// Column names of the row-oriented session files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedLayout {
    /// Row ordinal column. The historical exports leave its header blank.
    pub row_column: String,
    /// Date-time column (`YYYY-MM-DD HH:MM:SS`).
    pub date_column: String,
    /// Record type column (`BID`, `ASK`, `TRADE`).
    pub type_column: String,
    /// Price column.
    pub price_column: String,
    /// Size column.
    pub size_column: String,
}

impl Default for FeedLayout {
    fn default() -> Self {
        Self {
            row_column: String::new(),
            date_column: "Date".to_string(),
            type_column: "Type".to_string(),
            price_column: "Price".to_string(),
            size_column: "Size".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReplayConfig::default();
        assert_eq!(config.engine.warmup_rows, 5);
        assert_eq!(config.engine.bucket_seconds, 10);
        assert_eq!(config.feed.date_column, "Date");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = ReplayConfig::from_json_str(
            r#"{ "instrument": { "symbol": "DI1F21" }, "engine": { "start_session": 3 } }"#,
        )
        .unwrap();
        assert_eq!(config.instrument.symbol, "DI1F21");
        assert_eq!(config.engine.start_session, 3);
        assert_eq!(config.engine.bucket_seconds, 10);
        assert_eq!(config.feed.price_column, "Price");
    }

    #[test]
    fn test_rejects_zero_bucket() {
        let err = ReplayConfig::from_json_str(r#"{ "engine": { "bucket_seconds": 0 } }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
