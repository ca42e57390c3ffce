//! Core types and configuration for the lobsim replay system.
//!
//! This crate provides shared types used across all other crates:
//! - Feed records and book mutation commands
//! - Top-of-book snapshots and metric buckets
//! - The read/mutate seam onto the order book
//! - Configuration structures
//! - Common error types

pub mod book;
pub mod config;
pub mod error;
pub mod types;

pub use book::{BookState, BookView};
pub use config::ReplayConfig;
pub use error::{Error, Result};
pub use types::*;
