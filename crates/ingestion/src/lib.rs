//! Data ingestion and normalization for the lobsim replay system.
//!
//! This crate handles:
//! - Session sources (zip archives, CSV directories, in-memory)
//! - Row parsing (header-driven columns, seconds-of-day timestamps)
//! - Row translation into book mutation commands

pub mod parser;
pub mod source;
pub mod translator;

pub use parser::{parse_seconds_of_day, RowParser};
pub use source::{DirectorySource, SessionRows, SessionSource, VecSource, ZipArchiveSource};
pub use translator::{infer_resting_side, LevelOneTranslator, RowTranslator};
