//! Core domain types and logic.

pub mod assembler;
pub mod backtest;
pub mod config_validation;
pub mod digest;
pub mod enriched;
pub mod error;
pub mod indicator;
pub mod indicator_helpers;
pub mod ohlcv;
pub mod overlay;
pub mod quote;
pub mod rule_weights;
pub mod scoring;
pub mod watchlist;
