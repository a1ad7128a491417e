//! Williams %R oscillator.
//!
//! %R[i] = -100 * (HH - C[i]) / (HH - LL), where HH/LL are the highest high
//! and lowest low over the n+1 samples ending at i. Defined for i >= n.
//! A flat window (HH == LL) has no value; it is stored as `None`.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::error::CrosstraderError;

pub const DEFAULT_PERIOD: usize = 14;

/// Raw oscillator values for indices `period..len`.
pub fn calculate_williams_r(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Result<Vec<Option<f64>>, CrosstraderError> {
    if closes.is_empty() {
        return Err(CrosstraderError::EmptySeries);
    }
    for column in [highs, lows] {
        if column.len() != closes.len() {
            return Err(CrosstraderError::MisalignedSeries {
                expected: closes.len(),
                actual: column.len(),
            });
        }
    }
    if period == 0 || period >= closes.len() {
        return Err(CrosstraderError::InvalidPeriod {
            period,
            len: closes.len(),
        });
    }

    let values = (period..closes.len())
        .map(|i| {
            let window = i - period..=i;
            let highest_high = highs[window.clone()]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            let lowest_low = lows[window].iter().copied().fold(f64::INFINITY, f64::min);

            let range = highest_high - lowest_low;
            (range != 0.0).then(|| -100.0 * (highest_high - closes[i]) / range)
        })
        .collect();
    Ok(values)
}

/// Williams %R keyed by date.
#[derive(Debug, Clone, PartialEq)]
pub struct WilliamsRSeries {
    period: usize,
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
    date_index: HashMap<NaiveDate, usize>,
}

impl WilliamsRSeries {
    /// `dates` must be the full source axis; values attach to its tail.
    pub fn new(
        period: usize,
        dates: &[NaiveDate],
        values: Vec<Option<f64>>,
    ) -> Result<Self, CrosstraderError> {
        if values.len() > dates.len() {
            return Err(CrosstraderError::MisalignedSeries {
                expected: dates.len(),
                actual: values.len(),
            });
        }
        let dates = dates[dates.len() - values.len()..].to_vec();
        let date_index = dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();
        Ok(Self {
            period,
            dates,
            values,
            date_index,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Value on `date`; `Ok(None)` when the window was flat.
    pub fn get(&self, date: NaiveDate) -> Result<Option<f64>, CrosstraderError> {
        self.date_index
            .get(&date)
            .map(|&i| self.values[i])
            .ok_or(CrosstraderError::UnknownDate { date })
    }

    /// Like [`get`](Self::get) but a flat window is an `UndefinedRange` error.
    pub fn value_at(&self, date: NaiveDate) -> Result<f64, CrosstraderError> {
        self.get(date)?
            .ok_or(CrosstraderError::UndefinedRange { date })
    }
}
