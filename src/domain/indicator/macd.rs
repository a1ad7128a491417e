//! MACD (Moving Average Convergence Divergence) and its signal line.
//!
//! MACD Line = EMA(short) - EMA(long), both right-aligned to the long EMA
//! Signal Line = EMA(signal) of the MACD line, MACD right-aligned to it
//!
//! Default parameters: short=12, long=26, signal=9.
//! Output length: len - long + 1 - signal + 1, ending on the last source value.

use crate::domain::error::CrosstraderError;
use crate::domain::indicator::ema::calculate_ema;

pub const DEFAULT_SHORT: usize = 12;
pub const DEFAULT_LONG: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

/// Returns `(macd, signal)` of equal length.
pub fn calculate_macd(
    values: &[f64],
    short_period: usize,
    long_period: usize,
    signal_period: usize,
) -> Result<(Vec<f64>, Vec<f64>), CrosstraderError> {
    if short_period >= long_period {
        return Err(CrosstraderError::InvalidConfig {
            reason: format!(
                "MACD short period ({short_period}) must be less than long period ({long_period})"
            ),
        });
    }

    let short_ema = calculate_ema(values, short_period)?;
    let long_ema = calculate_ema(values, long_period)?;

    let short_ema = right_align(&short_ema, long_ema.len());
    let macd: Vec<f64> = short_ema
        .iter()
        .zip(&long_ema)
        .map(|(short, long)| short - long)
        .collect();

    let signal = calculate_ema(&macd, signal_period)?;
    let macd = right_align(&macd, signal.len()).to_vec();

    Ok((macd, signal))
}

pub fn calculate_macd_default(values: &[f64]) -> Result<(Vec<f64>, Vec<f64>), CrosstraderError> {
    calculate_macd(values, DEFAULT_SHORT, DEFAULT_LONG, DEFAULT_SIGNAL)
}

/// Number of source values consumed before the first MACD/signal pair.
pub fn warmup(long_period: usize, signal_period: usize) -> usize {
    (long_period + signal_period).saturating_sub(2)
}

/// Last `len` elements of `values`.
pub(crate) fn right_align<T>(values: &[T], len: usize) -> &[T] {
    &values[values.len().saturating_sub(len)..]
}
