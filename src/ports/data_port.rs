//! Price data access port trait.

use crate::domain::error::CrosstraderError;
use crate::domain::price::PricePoint;
use chrono::NaiveDate;

pub trait DataPort {
    /// Prices sorted ascending with unique dates, optionally bounded
    /// (inclusive) by `start_date` and `end_date`.
    fn fetch_prices(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, CrosstraderError>;

    /// First date, last date and number of points, or `None` with no data.
    fn get_data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, CrosstraderError> {
        let prices = self.fetch_prices(None, None)?;
        Ok(match (prices.first(), prices.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, prices.len())),
            _ => None,
        })
    }
}
