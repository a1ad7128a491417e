//! End-to-end run: indicators, signals, simulation and round-trip report.

use chrono::NaiveDate;
use tracing::info;

use super::benefit::{round_trips, RoundTrip};
use super::error::CrosstraderError;
use super::indicator::{IndicatorBundle, IndicatorConfig, IndicatorEngine};
use super::series::TimeSeriesStore;
use super::signal::{SignalConfig, SignalDetector, Signals};
use super::simulation::{simulate, SimulationConfig, SimulationReport};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BacktestConfig {
    pub indicators: IndicatorConfig,
    pub signals: SignalConfig,
    pub simulation: SimulationConfig,
    /// Open the round-trip report with a synthetic buy on the first date of
    /// the series when the first signal is a sell.
    pub assume_initial_position: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub window_start: NaiveDate,
    pub indicators: IndicatorBundle,
    pub signals: Signals,
    pub report: SimulationReport,
    pub round_trips: Vec<RoundTrip>,
}

/// First date of the trailing `window` points (the first date when `None`).
pub fn window_start(
    store: &TimeSeriesStore,
    window: Option<usize>,
) -> Result<NaiveDate, CrosstraderError> {
    if store.is_empty() {
        return Err(CrosstraderError::EmptySeries);
    }
    let len = store.len();
    let n = window.unwrap_or(len).clamp(1, len);
    Ok(store.dates()[len - n])
}

pub fn run_backtest(
    store: &TimeSeriesStore,
    config: &BacktestConfig,
) -> Result<BacktestResult, CrosstraderError> {
    let start = window_start(store, config.signals.window)?;

    let indicators = IndicatorEngine::new(config.indicators).compute(store)?;
    let signals = SignalDetector::new(config.signals).detect(&indicators)?;

    let result = simulate(
        store,
        &signals,
        config.simulation.initial_state(),
        config.simulation.commission,
    )?;
    let report = SimulationReport::new(store, result, start)?;

    let opening = store.first_date().filter(|_| config.assume_initial_position);
    let round_trips = round_trips(store, &signals, opening)?;

    info!(
        from = %start,
        to = %report.end.date,
        buys = signals.buy_dates.len(),
        sells = signals.sell_dates.len(),
        final_total = report.end.total,
        "backtest complete"
    );

    Ok(BacktestResult {
        window_start: start,
        indicators,
        signals,
        report,
        round_trips,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;

    fn store(n: usize) -> TimeSeriesStore {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        TimeSeriesStore::new(
            (0..n)
                .map(|i| {
                    let close = 100.0 + (i as f64 / 5.0).sin() * 15.0;
                    PricePoint::new(
                        start + chrono::Duration::days(i as i64),
                        close,
                        close + 1.5,
                        close - 1.5,
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn window_start_clamps() {
        let store = store(10);
        assert_eq!(window_start(&store, None).unwrap(), store.dates()[0]);
        assert_eq!(window_start(&store, Some(3)).unwrap(), store.dates()[7]);
        assert_eq!(window_start(&store, Some(50)).unwrap(), store.dates()[0]);
        assert!(window_start(&TimeSeriesStore::default(), None).is_err());
    }

    #[test]
    fn run_backtest_produces_consistent_result() {
        let store = store(200);
        let config = BacktestConfig {
            signals: SignalConfig {
                range_filter: false,
                ..SignalConfig::default()
            },
            simulation: SimulationConfig {
                cash: 1000.0,
                shares: 0,
                commission: 0.0,
            },
            ..BacktestConfig::default()
        };
        let result = run_backtest(&store, &config).unwrap();

        assert!(!result.signals.is_empty());
        assert_eq!(result.report.result.action_count, result.signals.len());
        assert_eq!(result.report.end.date, *store.dates().last().unwrap());
        assert!(result.report.result.ledger.len() <= result.signals.len());

        let rerun = run_backtest(&store, &config).unwrap();
        assert_eq!(result, rerun);
    }

    #[test]
    fn leading_sell_opens_on_first_series_date() {
        let store = store(400);
        let mut leading_sells = 0;
        for window in (40..=160).step_by(6) {
            let config = BacktestConfig {
                signals: SignalConfig {
                    range_filter: false,
                    window: Some(window),
                    ..SignalConfig::default()
                },
                assume_initial_position: true,
                ..BacktestConfig::default()
            };
            let result = run_backtest(&store, &config).unwrap();
            let (Some(&first_buy), Some(&first_sell)) = (
                result.signals.buy_dates.first(),
                result.signals.sell_dates.first(),
            ) else {
                continue;
            };

            let opening = result.round_trips[0].buy_date;
            if first_sell < first_buy {
                leading_sells += 1;
                assert_eq!(opening, store.dates()[0], "window {window}");
                assert_ne!(opening, result.window_start, "window {window}");
                assert_eq!(result.round_trips[0].sell_date, first_sell);
            } else {
                assert_eq!(opening, first_buy, "window {window}");
            }
        }
        assert!(leading_sells > 0);
    }

    #[test]
    fn leading_sell_dropped_without_assumed_position() {
        let store = store(400);
        for window in (40..=160).step_by(6) {
            let config = BacktestConfig {
                signals: SignalConfig {
                    range_filter: false,
                    window: Some(window),
                    ..SignalConfig::default()
                },
                assume_initial_position: false,
                ..BacktestConfig::default()
            };
            let result = run_backtest(&store, &config).unwrap();
            if let Some(trip) = result.round_trips.first() {
                assert_eq!(Some(&trip.buy_date), result.signals.buy_dates.first());
                assert!(trip.buy_date >= result.window_start);
            }
        }
    }

    #[test]
    fn williams_period_beyond_macd_warmup_is_rejected_up_front() {
        let config = BacktestConfig {
            indicators: IndicatorConfig {
                williams_period: 60,
                ..IndicatorConfig::default()
            },
            ..BacktestConfig::default()
        };
        let err = run_backtest(&store(200), &config).unwrap_err();
        assert!(matches!(err, CrosstraderError::InvalidConfig { .. }));
    }

    #[test]
    fn run_backtest_on_empty_store() {
        let err = run_backtest(&TimeSeriesStore::default(), &BacktestConfig::default()).unwrap_err();
        assert!(matches!(err, CrosstraderError::EmptySeries));
    }
}
