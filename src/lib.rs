//! BACKSPENDER: randomized cross-chain stablecoin rebalancing bot
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod bridge;
pub mod chain;
pub mod config;
pub mod engine;
pub mod types;
