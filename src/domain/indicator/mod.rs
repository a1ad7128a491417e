//! Technical indicators computed from a [`TimeSeriesStore`].
//!
//! - `ema`: exponential moving average over a value slice
//! - `macd`: MACD line and signal line, right-aligned to the source
//! - `williams_r`: Williams %R oscillator keyed by date
//!
//! [`IndicatorEngine`] bundles the MACD/signal pair and Williams %R for one
//! configuration. Everything here is a pure function of its inputs.

pub mod ema;
pub mod macd;
pub mod williams_r;

use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

use crate::domain::error::CrosstraderError;
use crate::domain::series::TimeSeriesStore;

pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use williams_r::{calculate_williams_r, WilliamsRSeries};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub short_period: usize,
    pub long_period: usize,
    pub signal_period: usize,
    pub williams_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            short_period: macd::DEFAULT_SHORT,
            long_period: macd::DEFAULT_LONG,
            signal_period: macd::DEFAULT_SIGNAL,
            williams_period: williams_r::DEFAULT_PERIOD,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), CrosstraderError> {
        if self.short_period == 0 || self.signal_period == 0 || self.williams_period == 0 {
            return Err(CrosstraderError::InvalidConfig {
                reason: format!("indicator periods must be positive ({self})"),
            });
        }
        if self.short_period >= self.long_period {
            return Err(CrosstraderError::InvalidConfig {
                reason: format!(
                    "MACD short period ({}) must be less than long period ({})",
                    self.short_period, self.long_period
                ),
            });
        }
        let warmup = macd::warmup(self.long_period, self.signal_period);
        if self.williams_period > warmup {
            return Err(CrosstraderError::InvalidConfig {
                reason: format!(
                    "Williams %R period ({}) must not exceed long + signal - 2 ({warmup}) \
                     so every MACD date has a %R value",
                    self.williams_period
                ),
            });
        }
        Ok(())
    }

    /// Minimum number of price points needed to produce one MACD/signal pair.
    pub fn min_points(&self) -> usize {
        macd::warmup(self.long_period, self.signal_period) + 1
    }
}

impl fmt::Display for IndicatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MACD({},{},{}) W%R({})",
            self.short_period, self.long_period, self.signal_period, self.williams_period
        )
    }
}

/// MACD and signal line on a shared date axis ending at the last source date.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub dates: Vec<NaiveDate>,
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
}

impl MacdSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// MACD - signal
    pub fn histogram(&self) -> Vec<f64> {
        self.macd
            .iter()
            .zip(&self.signal)
            .map(|(m, s)| m - s)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorBundle {
    pub macd: MacdSeries,
    pub williams_r: WilliamsRSeries,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// EMA of the store's closes; tail-aligned to the store's dates.
    pub fn ema(
        &self,
        store: &TimeSeriesStore,
        period: usize,
    ) -> Result<Vec<(NaiveDate, f64)>, CrosstraderError> {
        let ema = calculate_ema(store.closes(), period)?;
        let dates = macd::right_align(store.dates(), ema.len());
        Ok(dates.iter().copied().zip(ema).collect())
    }

    pub fn compute(&self, store: &TimeSeriesStore) -> Result<IndicatorBundle, CrosstraderError> {
        if store.is_empty() {
            return Err(CrosstraderError::EmptySeries);
        }
        self.config.validate()?;

        let (macd_line, signal_line) = calculate_macd(
            store.closes(),
            self.config.short_period,
            self.config.long_period,
            self.config.signal_period,
        )?;
        let dates = macd::right_align(store.dates(), signal_line.len()).to_vec();

        let williams = calculate_williams_r(
            store.highs(),
            store.lows(),
            store.closes(),
            self.config.williams_period,
        )?;
        let undefined = williams.iter().filter(|v| v.is_none()).count();
        let williams_r = WilliamsRSeries::new(self.config.williams_period, store.dates(), williams)?;

        debug!(
            config = %self.config,
            points = store.len(),
            macd_points = dates.len(),
            williams_points = williams_r.len(),
            undefined,
            "computed indicators"
        );

        Ok(IndicatorBundle {
            macd: MacdSeries {
                dates,
                macd: macd_line,
                signal: signal_line,
            },
            williams_r,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;

    fn make_store(n: usize) -> TimeSeriesStore {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.3).sin() * 10.0;
                PricePoint::new(
                    start + chrono::Duration::days(i as i64),
                    close,
                    close + 2.0,
                    close - 2.0,
                )
            })
            .collect();
        TimeSeriesStore::new(points)
    }

    #[test]
    fn config_display() {
        assert_eq!(IndicatorConfig::default().to_string(), "MACD(12,26,9) W%R(14)");
    }

    #[test]
    fn config_rejects_inverted_macd() {
        let config = IndicatorConfig {
            short_period: 26,
            long_period: 12,
            ..IndicatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CrosstraderError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn config_rejects_zero_period() {
        let config = IndicatorConfig {
            williams_period: 0,
            ..IndicatorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_rejects_williams_period_beyond_macd_warmup() {
        let at_limit = IndicatorConfig {
            williams_period: 33,
            ..IndicatorConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let too_long = IndicatorConfig {
            williams_period: 34,
            ..IndicatorConfig::default()
        };
        assert!(matches!(
            too_long.validate(),
            Err(CrosstraderError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn every_macd_date_has_williams_value_at_limit() {
        let config = IndicatorConfig {
            williams_period: 33,
            ..IndicatorConfig::default()
        };
        let bundle = IndicatorEngine::new(config).compute(&make_store(90)).unwrap();
        for date in &bundle.macd.dates {
            assert!(bundle.williams_r.get(*date).is_ok(), "no %R on {date}");
        }
    }

    #[test]
    fn min_points_default() {
        assert_eq!(IndicatorConfig::default().min_points(), 34);
    }

    #[test]
    fn bundle_shares_final_date() {
        let store = make_store(80);
        let bundle = IndicatorEngine::default().compute(&store).unwrap();

        assert_eq!(bundle.macd.len(), 80 - 34 + 1);
        assert_eq!(bundle.macd.macd.len(), bundle.macd.signal.len());
        assert_eq!(bundle.macd.dates.last(), store.dates().last());
        assert_eq!(bundle.williams_r.len(), 80 - 14);
        assert_eq!(bundle.williams_r.dates().first(), Some(&store.dates()[14]));
        assert_eq!(bundle.williams_r.dates().last(), store.dates().last());
    }

    #[test]
    fn compute_is_deterministic() {
        let store = make_store(120);
        let engine = IndicatorEngine::default();
        let first = engine.compute(&store).unwrap();
        let second = engine.compute(&store).unwrap();

        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first.macd.macd), bits(&second.macd.macd));
        assert_eq!(bits(&first.macd.signal), bits(&second.macd.signal));
        assert_eq!(first, second);
    }

    #[test]
    fn compute_on_empty_store() {
        let store = TimeSeriesStore::new(vec![]);
        let err = IndicatorEngine::default().compute(&store).unwrap_err();
        assert!(matches!(err, CrosstraderError::EmptySeries));
    }

    #[test]
    fn compute_on_short_store() {
        let store = make_store(20);
        let err = IndicatorEngine::default().compute(&store).unwrap_err();
        assert!(matches!(err, CrosstraderError::InvalidPeriod { .. }));
    }

    #[test]
    fn ema_is_date_aligned() {
        let store = make_store(10);
        let ema = IndicatorEngine::default().ema(&store, 4).unwrap();
        assert_eq!(ema.len(), 7);
        assert_eq!(ema[0].0, store.dates()[3]);
        assert_eq!(ema.last().unwrap().0, store.dates()[9]);
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let store = make_store(60);
        let bundle = IndicatorEngine::default().compute(&store).unwrap();
        let hist = bundle.macd.histogram();
        for i in 0..hist.len() {
            assert!((hist[i] - (bundle.macd.macd[i] - bundle.macd.signal[i])).abs() < f64::EPSILON);
        }
    }
}
