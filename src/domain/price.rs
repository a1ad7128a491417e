//! Daily price point representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64, high: f64, low: f64) -> Self {
        PricePoint {
            date,
            close,
            high,
            low,
        }
    }

    /// high - low
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}
