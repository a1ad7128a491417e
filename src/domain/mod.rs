//! Core domain types and logic.

pub mod price;
pub mod series;
pub mod indicator;
pub mod signal;
pub mod simulation;
pub mod benefit;
pub mod backtest;
pub mod config_validation;
pub mod error;
