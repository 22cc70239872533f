//! Core library for the auto-swapper.
//!
//! Repeatedly swaps a random pair from a small token catalog through a
//! Uniswap V2 style router, one confirmed transaction at a time, with a
//! randomized pause between attempts.

pub mod approvals;
pub mod chain;
pub mod config;
pub mod errors;
pub mod models;
pub mod runner;
pub mod summary;
pub mod swap;
pub mod tokens;
pub mod utils;
