//! crosstrader: MACD crossover signals with a Williams %R filter, and a
//! deterministic cash/shares backtest.
//!
//! Hexagonal architecture: numeric core in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
