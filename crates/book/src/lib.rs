//! Order book state for the lobsim replay system.
//!
//! A price-indexed Level-I book that accepts normalized mutation commands
//! and answers best-price queries. The replay engine creates one per session.

pub mod book;

pub use book::LimitOrderBook;
