//! Port traits the domain talks to: price data, configuration and ledger
//! output.

pub mod config_port;
pub mod data_port;
pub mod ledger_port;
