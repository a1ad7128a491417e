//! Immutable, date-ordered price series with a date index.
//!
//! The store keeps one column per field so indicator code can borrow
//! `&[f64]` slices directly, plus a `HashMap<NaiveDate, usize>` for O(1)
//! point lookup. Input must already be sorted ascending with unique dates;
//! the loader is responsible for that.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::error::CrosstraderError;
use super::price::PricePoint;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesStore {
    dates: Vec<NaiveDate>,
    closes: Vec<f64>,
    highs: Vec<f64>,
    lows: Vec<f64>,
    date_index: HashMap<NaiveDate, usize>,
}

impl TimeSeriesStore {
    pub fn new(points: Vec<PricePoint>) -> Self {
        let mut store = TimeSeriesStore {
            dates: Vec::with_capacity(points.len()),
            closes: Vec::with_capacity(points.len()),
            highs: Vec::with_capacity(points.len()),
            lows: Vec::with_capacity(points.len()),
            date_index: HashMap::with_capacity(points.len()),
        };
        for (i, point) in points.into_iter().enumerate() {
            store.dates.push(point.date);
            store.closes.push(point.close);
            store.highs.push(point.high);
            store.lows.push(point.low);
            store.date_index.insert(point.date, i);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn highs(&self) -> &[f64] {
        &self.highs
    }

    pub fn lows(&self) -> &[f64] {
        &self.lows
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    /// Close price on `date`.
    pub fn price_at(&self, date: NaiveDate) -> Result<f64, CrosstraderError> {
        self.index_of(date)
            .map(|i| self.closes[i])
            .ok_or(CrosstraderError::UnknownDate { date })
    }

    pub fn point(&self, index: usize) -> Option<PricePoint> {
        (index < self.len()).then(|| {
            PricePoint::new(
                self.dates[index],
                self.closes[index],
                self.highs[index],
                self.lows[index],
            )
        })
    }

    /// A new store over the last `n` points (all of them when `n >= len`).
    pub fn tail(&self, n: usize) -> TimeSeriesStore {
        let start = self.len().saturating_sub(n);
        let points = (start..self.len()).filter_map(|i| self.point(i)).collect();
        TimeSeriesStore::new(points)
    }
}
