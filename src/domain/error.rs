//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for crosstrader.
#[derive(Debug, thiserror::Error)]
pub enum CrosstraderError {
    #[error("invalid period {period} for a series of length {len}")]
    InvalidPeriod { period: usize, len: usize },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("no data for date {date}")]
    UnknownDate { date: NaiveDate },

    #[error("series is empty")]
    EmptySeries,

    #[error("Williams %R is undefined on {date}: zero high/low range")]
    UndefinedRange { date: NaiveDate },

    #[error("misaligned series: expected length {expected}, got {actual}")]
    MisalignedSeries { expected: usize, actual: usize },

    #[error("invalid price {price} on {date}")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to load prices: {reason}")]
    DataLoad { reason: String },

    #[error("failed to write ledger: {reason}")]
    LedgerWrite { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CrosstraderError> for std::process::ExitCode {
    fn from(err: &CrosstraderError) -> Self {
        let code: u8 = match err {
            CrosstraderError::Io(_) | CrosstraderError::LedgerWrite { .. } => 1,
            CrosstraderError::ConfigParse { .. }
            | CrosstraderError::ConfigMissing { .. }
            | CrosstraderError::ConfigInvalid { .. } => 2,
            CrosstraderError::DataLoad { .. } | CrosstraderError::EmptySeries => 3,
            CrosstraderError::InvalidPeriod { .. }
            | CrosstraderError::InvalidConfig { .. }
            | CrosstraderError::UnknownDate { .. }
            | CrosstraderError::UndefinedRange { .. }
            | CrosstraderError::MisalignedSeries { .. }
            | CrosstraderError::InvalidPrice { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
