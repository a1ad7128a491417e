//! Buy/sell signal detection from MACD/signal crossovers.
//!
//! Three stages, each a pure function:
//! 1. [`intersections`] finds where one series crosses another.
//! 2. [`filter_by_range`] keeps buys in oversold and sells in overbought
//!    Williams %R territory.
//! 3. [`alternate`] reduces the survivors to a strict buy/sell alternation.
//!
//! [`buy_and_sell_dates`] chains them for an [`IndicatorBundle`].

use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

use crate::domain::error::CrosstraderError;
use crate::domain::indicator::{IndicatorBundle, WilliamsRSeries};

pub const DEFAULT_OVERSOLD: f64 = -70.0;
pub const DEFAULT_OVERBOUGHT: f64 = -30.0;

/// `Buy` orders before `Sell`, which settles same-date ties when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    Buy,
    Sell,
}

impl SignalKind {
    pub fn opposite(self) -> Self {
        match self {
            SignalKind::Buy => SignalKind::Sell,
            SignalKind::Sell => SignalKind::Buy,
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => f.pad("BUY"),
            SignalKind::Sell => f.pad("SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal<D = NaiveDate> {
    pub date: D,
    pub kind: SignalKind,
}

/// Crossover candidates as `(date, y1 value)` pairs, each list in date order.
#[derive(Debug, Clone, PartialEq)]
pub struct Crossovers<D = NaiveDate> {
    /// y1 moved above y2 (buy side).
    pub ascending: Vec<(D, f64)>,
    /// y1 moved to or below y2 (sell side).
    pub descending: Vec<(D, f64)>,
}

impl<D: Copy> Crossovers<D> {
    pub fn buy_dates(&self) -> Vec<D> {
        self.ascending.iter().map(|&(d, _)| d).collect()
    }

    pub fn sell_dates(&self) -> Vec<D> {
        self.descending.iter().map(|&(d, _)| d).collect()
    }
}

/// Filtered, strictly alternating buy and sell dates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signals<D = NaiveDate> {
    pub buy_dates: Vec<D>,
    pub sell_dates: Vec<D>,
}

impl<D> Default for Signals<D> {
    fn default() -> Self {
        Signals {
            buy_dates: Vec::new(),
            sell_dates: Vec::new(),
        }
    }
}

impl<D: Ord + Copy> Signals<D> {
    pub fn len(&self) -> usize {
        self.buy_dates.len() + self.sell_dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buy_dates.is_empty() && self.sell_dates.is_empty()
    }

    /// Buys and sells merged into one chronological list.
    pub fn actions(&self) -> Vec<Signal<D>> {
        let mut actions: Vec<Signal<D>> = self
            .buy_dates
            .iter()
            .map(|&date| Signal {
                date,
                kind: SignalKind::Buy,
            })
            .chain(self.sell_dates.iter().map(|&date| Signal {
                date,
                kind: SignalKind::Sell,
            }))
            .collect();
        actions.sort_by(|a, b| a.date.cmp(&b.date).then(a.kind.cmp(&b.kind)));
        actions
    }
}

/// Crossovers of `y1` over `y2` within the trailing `window` samples.
///
/// `x` is right-aligned to `y1`, so it may be longer (e.g. the full date axis).
/// `window` defaults to the whole series and is clamped to its length.
pub fn intersections<D: Copy>(
    x: &[D],
    y1: &[f64],
    y2: &[f64],
    window: Option<usize>,
) -> Result<Crossovers<D>, CrosstraderError> {
    let len = y1.len();
    if y2.len() != len {
        return Err(CrosstraderError::MisalignedSeries {
            expected: len,
            actual: y2.len(),
        });
    }
    if x.len() < len {
        return Err(CrosstraderError::MisalignedSeries {
            expected: len,
            actual: x.len(),
        });
    }
    let x = &x[x.len() - len..];

    let mut crossovers = Crossovers {
        ascending: Vec::new(),
        descending: Vec::new(),
    };

    let window = window.unwrap_or(len).min(len);
    if window < 2 {
        return Ok(crossovers);
    }

    for i in (len - window + 1)..len {
        let above_before = y1[i - 1] > y2[i - 1];
        let above_after = y1[i] > y2[i];
        match (above_before, above_after) {
            (true, false) => crossovers.descending.push((x[i], y1[i])),
            (false, true) => crossovers.ascending.push((x[i], y1[i])),
            _ => {}
        }
    }
    Ok(crossovers)
}

/// Keep buys with %R below `oversold` and sells with %R above `overbought`.
///
/// A date with an undefined %R satisfies neither bound and is dropped.
pub fn filter_by_range(
    buy_dates: &[NaiveDate],
    sell_dates: &[NaiveDate],
    williams_r: &WilliamsRSeries,
    oversold: f64,
    overbought: f64,
) -> Result<(Vec<NaiveDate>, Vec<NaiveDate>), CrosstraderError> {
    let buys = retain_dates(buy_dates, williams_r, |v| v < oversold)?;
    let sells = retain_dates(sell_dates, williams_r, |v| v > overbought)?;
    Ok((buys, sells))
}

fn retain_dates(
    dates: &[NaiveDate],
    williams_r: &WilliamsRSeries,
    accept: impl Fn(f64) -> bool,
) -> Result<Vec<NaiveDate>, CrosstraderError> {
    let mut kept = Vec::with_capacity(dates.len());
    for &date in dates {
        if williams_r.get(date)?.is_some_and(&accept) {
            kept.push(date);
        }
    }
    Ok(kept)
}

/// Reduce candidates to a strict buy/sell alternation with increasing dates.
///
/// Candidates are merged by date (buy first on a tie). The first candidate of
/// either kind opens the sequence; after that only the opposite kind with a
/// later date is accepted, so the first of a same-kind run wins.
pub fn alternate<D: Ord + Copy>(buy_dates: &[D], sell_dates: &[D]) -> Signals<D> {
    let candidates = Signals {
        buy_dates: buy_dates.to_vec(),
        sell_dates: sell_dates.to_vec(),
    }
    .actions();

    let mut out = Signals::default();
    let mut expected: Option<SignalKind> = None;
    let mut last_date: Option<D> = None;

    for candidate in candidates {
        if expected.is_some_and(|kind| kind != candidate.kind) {
            continue;
        }
        if last_date.is_some_and(|last| candidate.date <= last) {
            continue;
        }
        match candidate.kind {
            SignalKind::Buy => out.buy_dates.push(candidate.date),
            SignalKind::Sell => out.sell_dates.push(candidate.date),
        }
        last_date = Some(candidate.date);
        expected = Some(candidate.kind.opposite());
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConfig {
    pub range_filter: bool,
    pub oversold: f64,
    pub overbought: f64,
    /// Trailing number of MACD samples to scan; `None` scans all of them.
    pub window: Option<usize>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig {
            range_filter: true,
            oversold: DEFAULT_OVERSOLD,
            overbought: DEFAULT_OVERBOUGHT,
            window: None,
        }
    }
}

impl SignalConfig {
    pub fn validate(&self) -> Result<(), CrosstraderError> {
        for (name, value) in [("oversold", self.oversold), ("overbought", self.overbought)] {
            if !(-100.0..=0.0).contains(&value) {
                return Err(CrosstraderError::InvalidConfig {
                    reason: format!("{name} threshold {value} is outside [-100, 0]"),
                });
            }
        }
        if self.oversold >= self.overbought {
            return Err(CrosstraderError::InvalidConfig {
                reason: format!(
                    "oversold threshold ({}) must be below overbought threshold ({})",
                    self.oversold, self.overbought
                ),
            });
        }
        if let Some(window) = self.window.filter(|&w| w < 2) {
            return Err(CrosstraderError::InvalidConfig {
                reason: format!("signal window must cover at least 2 samples, got {window}"),
            });
        }
        Ok(())
    }
}

/// Crossover, optional range filter, then alternation.
pub fn buy_and_sell_dates(
    bundle: &IndicatorBundle,
    config: &SignalConfig,
) -> Result<Signals, CrosstraderError> {
    config.validate()?;

    let crossovers = intersections(
        &bundle.macd.dates,
        &bundle.macd.macd,
        &bundle.macd.signal,
        config.window,
    )?;
    let buys = crossovers.buy_dates();
    let sells = crossovers.sell_dates();

    let (buys, sells) = if config.range_filter {
        filter_by_range(
            &buys,
            &sells,
            &bundle.williams_r,
            config.oversold,
            config.overbought,
        )?
    } else {
        (buys, sells)
    };

    let signals = alternate(&buys, &sells);
    debug!(
        ascending = crossovers.ascending.len(),
        descending = crossovers.descending.len(),
        filtered_buys = buys.len(),
        filtered_sells = sells.len(),
        buys = signals.buy_dates.len(),
        sells = signals.sell_dates.len(),
        "detected signals"
    );
    Ok(signals)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SignalDetector {
    config: SignalConfig,
}

impl SignalDetector {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Raw MACD/signal crossovers inside the configured window.
    pub fn candidates(
        &self,
        bundle: &IndicatorBundle,
    ) -> Result<Crossovers, CrosstraderError> {
        intersections(
            &bundle.macd.dates,
            &bundle.macd.macd,
            &bundle.macd.signal,
            self.config.window,
        )
    }

    pub fn detect(&self, bundle: &IndicatorBundle) -> Result<Signals, CrosstraderError> {
        buy_and_sell_dates(bundle, &self.config)
    }
}
