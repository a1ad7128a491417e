//! Per-share benefit of each buy/sell round trip.
//!
//! Presentation only: nothing here feeds back into the simulator. When the
//! first sell comes before the first buy, an `assumed_opening` date stands in
//! as the opening buy; without one the unmatched sell is dropped.

use chrono::NaiveDate;

use super::error::CrosstraderError;
use super::series::TimeSeriesStore;
use super::signal::Signals;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundTrip {
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub buy_price: f64,
    pub sell_price: f64,
}

impl RoundTrip {
    /// Profit from holding one share through the trip.
    pub fn benefit(&self) -> f64 {
        self.sell_price - self.buy_price
    }

    pub fn is_win(&self) -> bool {
        self.sell_price > self.buy_price
    }
}

pub fn round_trips(
    store: &TimeSeriesStore,
    signals: &Signals,
    assumed_opening: Option<NaiveDate>,
) -> Result<Vec<RoundTrip>, CrosstraderError> {
    let mut buy_dates = signals.buy_dates.clone();
    let mut sell_dates = signals.sell_dates.as_slice();

    let opens_with_sell = match (sell_dates.first(), buy_dates.first()) {
        (Some(sell), Some(buy)) => sell < buy,
        (Some(_), None) => true,
        _ => false,
    };
    if opens_with_sell {
        match assumed_opening {
            Some(opening) => buy_dates.insert(0, opening),
            None => sell_dates = &sell_dates[1..],
        }
    }

    buy_dates
        .iter()
        .zip(sell_dates)
        .map(|(&buy_date, &sell_date)| {
            Ok(RoundTrip {
                buy_date,
                sell_date,
                buy_price: store.price_at(buy_date)?,
                sell_price: store.price_at(sell_date)?,
            })
        })
        .collect()
}

/// Summary over a set of round trips.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BenefitSummary {
    pub trips: usize,
    pub wins: usize,
    pub total_benefit: f64,
}

impl BenefitSummary {
    pub fn from_trips(trips: &[RoundTrip]) -> Self {
        BenefitSummary {
            trips: trips.len(),
            wins: trips.iter().filter(|t| t.is_win()).count(),
            total_benefit: trips.iter().map(RoundTrip::benefit).sum(),
        }
    }

    pub fn win_rate(&self) -> f64 {
        if self.trips == 0 {
            0.0
        } else {
            self.wins as f64 / self.trips as f64
        }
    }
}
