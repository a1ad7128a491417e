//! Cash/shares portfolio simulation over an alternating signal list.
//!
//! Buy: spend all cash on whole shares at `price * (1 + commission)`, that is
//! `floor(cash / unit_cost)` shares. When float rounding makes that count cost
//! more than the cash on hand, one share fewer is bought, so a buy can come
//! out one share below the plain floor but never overdraws.
//! Sell: liquidate every share at `price * (1 - commission)`.
//! A transition that cannot move anything (no cash for one share, or no
//! shares to sell) is a no-op but still counts as a processed action.
//!
//! Holdings are capped at [`MAX_SHARES`] so every ledger delta fits an `i64`.

use chrono::NaiveDate;
use tracing::{debug, trace};

use super::error::CrosstraderError;
use super::series::TimeSeriesStore;
use super::signal::{Signal, SignalKind, Signals};

/// Largest share count a portfolio may hold.
pub const MAX_SHARES: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub shares: u64,
}

impl PortfolioState {
    pub fn new(cash: f64, shares: u64) -> Self {
        PortfolioState { cash, shares }
    }

    /// cash + shares * price
    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.shares as f64 * price
    }
}

/// Starting position and commission for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub cash: f64,
    pub shares: u64,
    pub commission: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            cash: 0.0,
            shares: 10,
            commission: 0.0,
        }
    }
}

impl SimulationConfig {
    pub fn initial_state(&self) -> PortfolioState {
        PortfolioState::new(self.cash, self.shares)
    }
}

/// One transition with a non-zero effect.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub operation: SignalKind,
    pub shares_delta: i64,
    pub price: f64,
    pub cash_after: f64,
    pub shares_after: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub initial_state: PortfolioState,
    pub final_state: PortfolioState,
    pub action_count: usize,
    pub ledger: Vec<LedgerRow>,
}

#[derive(Debug, Clone)]
pub struct PortfolioSimulator {
    commission: f64,
    initial_state: PortfolioState,
    state: PortfolioState,
    action_count: usize,
    ledger: Vec<LedgerRow>,
}

impl PortfolioSimulator {
    pub fn new(initial_state: PortfolioState, commission: f64) -> Result<Self, CrosstraderError> {
        if !(0.0..1.0).contains(&commission) {
            return Err(CrosstraderError::InvalidConfig {
                reason: format!("commission must be in [0, 1), got {commission}"),
            });
        }
        if !initial_state.cash.is_finite() || initial_state.cash < 0.0 {
            return Err(CrosstraderError::InvalidConfig {
                reason: format!("initial cash must be non-negative, got {}", initial_state.cash),
            });
        }
        if initial_state.shares > MAX_SHARES {
            return Err(CrosstraderError::InvalidConfig {
                reason: format!(
                    "initial shares must not exceed {MAX_SHARES}, got {}",
                    initial_state.shares
                ),
            });
        }
        Ok(Self {
            commission,
            initial_state,
            state: initial_state,
            action_count: 0,
            ledger: Vec::new(),
        })
    }

    pub fn state(&self) -> PortfolioState {
        self.state
    }

    pub fn action_count(&self) -> usize {
        self.action_count
    }

    pub fn apply(&mut self, signal: Signal, price: f64) -> Result<(), CrosstraderError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(CrosstraderError::InvalidPrice {
                date: signal.date,
                price,
            });
        }
        self.action_count += 1;
        match signal.kind {
            SignalKind::Buy => self.buy(signal.date, price),
            SignalKind::Sell => self.sell(signal.date, price),
        }
    }

    fn buy(&mut self, date: NaiveDate, price: f64) -> Result<(), CrosstraderError> {
        let unit_cost = price * (1.0 + self.commission);
        let room = MAX_SHARES - self.state.shares;
        // `as` saturates for huge quotients; the cap keeps shares in range.
        let mut bought = ((self.state.cash / unit_cost).floor() as u64).min(room);
        if bought as f64 * unit_cost > self.state.cash {
            bought = bought.saturating_sub(1);
        }
        if bought == 0 {
            trace!(%date, cash = self.state.cash, price, "buy skipped: insufficient cash");
            return Ok(());
        }

        let shares = self
            .state
            .shares
            .checked_add(bought)
            .ok_or_else(|| share_overflow(date))?;
        let delta = i64::try_from(bought).map_err(|_| share_overflow(date))?;
        self.state.cash -= bought as f64 * unit_cost;
        self.state.shares = shares;
        self.record(date, SignalKind::Buy, delta, price);
        Ok(())
    }

    fn sell(&mut self, date: NaiveDate, price: f64) -> Result<(), CrosstraderError> {
        let sold = self.state.shares;
        if sold == 0 {
            trace!(%date, price, "sell skipped: no shares held");
            return Ok(());
        }

        let delta = i64::try_from(sold).map_err(|_| share_overflow(date))?;
        self.state.cash += sold as f64 * price * (1.0 - self.commission);
        self.state.shares = 0;
        self.record(date, SignalKind::Sell, -delta, price);
        Ok(())
    }

    fn record(&mut self, date: NaiveDate, operation: SignalKind, shares_delta: i64, price: f64) {
        debug!(
            %date,
            %operation,
            shares_delta,
            price,
            cash = self.state.cash,
            shares = self.state.shares,
            "transaction"
        );
        self.ledger.push(LedgerRow {
            date,
            operation,
            shares_delta,
            price,
            cash_after: self.state.cash,
            shares_after: self.state.shares,
        });
    }

    pub fn finish(self) -> SimulationResult {
        SimulationResult {
            initial_state: self.initial_state,
            final_state: self.state,
            action_count: self.action_count,
            ledger: self.ledger,
        }
    }
}

fn share_overflow(date: NaiveDate) -> CrosstraderError {
    CrosstraderError::InvalidConfig {
        reason: format!("share count on {date} exceeds {MAX_SHARES}"),
    }
}

/// Replay `signals` in chronological order against close prices from `store`.
pub fn simulate(
    store: &TimeSeriesStore,
    signals: &Signals,
    initial_state: PortfolioState,
    commission: f64,
) -> Result<SimulationResult, CrosstraderError> {
    if store.is_empty() {
        return Err(CrosstraderError::EmptySeries);
    }
    let mut simulator = PortfolioSimulator::new(initial_state, commission)?;
    for signal in signals.actions() {
        let price = store.price_at(signal.date)?;
        simulator.apply(signal, price)?;
    }
    Ok(simulator.finish())
}

/// A portfolio state valued at one date's close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    pub date: NaiveDate,
    pub state: PortfolioState,
    pub price: f64,
    pub total: f64,
}

impl Valuation {
    pub fn at(
        store: &TimeSeriesStore,
        date: NaiveDate,
        state: PortfolioState,
    ) -> Result<Self, CrosstraderError> {
        let price = store.price_at(date)?;
        Ok(Valuation {
            date,
            state,
            price,
            total: state.total_value(price),
        })
    }
}

/// Simulation result with start, buy-and-hold and final valuations.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub result: SimulationResult,
    /// Initial state at the start of the analysed window.
    pub start: Valuation,
    /// Initial state held untouched to the last date.
    pub hold: Valuation,
    /// Final state at the last date.
    pub end: Valuation,
}

impl SimulationReport {
    pub fn new(
        store: &TimeSeriesStore,
        result: SimulationResult,
        start_date: NaiveDate,
    ) -> Result<Self, CrosstraderError> {
        let last = store.last_date().ok_or(CrosstraderError::EmptySeries)?;
        Ok(SimulationReport {
            start: Valuation::at(store, start_date, result.initial_state)?,
            hold: Valuation::at(store, last, result.initial_state)?,
            end: Valuation::at(store, last, result.final_state)?,
            result,
        })
    }

    /// Final total relative to the start total; `None` when starting from zero.
    pub fn total_return(&self) -> Option<f64> {
        (self.start.total > 0.0).then(|| self.end.total / self.start.total - 1.0)
    }
}
