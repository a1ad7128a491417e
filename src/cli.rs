//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_DATE_FORMAT};
use crate::adapters::csv_ledger_adapter::CsvLedgerAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::benefit::BenefitSummary;
use crate::domain::config_validation::validate_config;
use crate::domain::error::CrosstraderError;
use crate::domain::indicator::{macd, williams_r, IndicatorBundle, IndicatorConfig, IndicatorEngine};
use crate::domain::series::TimeSeriesStore;
use crate::domain::signal::{
    SignalConfig, SignalDetector, Signals, DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD,
};
use crate::domain::simulation::{SimulationConfig, Valuation};
use crate::logging;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::ledger_port::LedgerPort;

#[derive(Parser, Debug)]
#[command(
    name = "crosstrader",
    about = "MACD crossover signals with a Williams %R filter, and a cash/shares backtest"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect signals and simulate the portfolio over them
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overrides [data] path
        #[arg(long)]
        data: Option<PathBuf>,
        /// Only look for crossovers in the last N points
        #[arg(long)]
        window: Option<usize>,
        /// Write the transaction ledger here, overrides [report] ledger_path
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// List the alternating buy/sell signals
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        /// Skip the Williams %R range filter
        #[arg(long)]
        unfiltered: bool,
    },
    /// Print the latest indicator values
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        last: usize,
    },
    /// Validate a configuration file and its price data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the date range of the configured price data
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn execute(command: Command) -> Result<(), CrosstraderError> {
    match command {
        Command::Analyze {
            config,
            data,
            window,
            ledger,
        } => run_analyze(&config, data.as_deref(), window, ledger),
        Command::Signals {
            config,
            data,
            unfiltered,
        } => run_signals(&config, data.as_deref(), unfiltered),
        Command::Indicators { config, data, last } => {
            run_indicators(&config, data.as_deref(), last)
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, data } => run_info(&config, data.as_deref()),
    }
}

/// Load, validate and install logging from an INI file.
pub fn load_config(path: &Path) -> Result<FileConfigAdapter, CrosstraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    validate_config(&adapter)?;
    let level = adapter
        .get_non_empty("logging", "level")
        .unwrap_or_else(|| "info".to_string());
    logging::init(&level.to_lowercase());
    info!(path = %path.display(), "loaded config");
    Ok(adapter)
}

fn get_usize(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, CrosstraderError> {
    let value = adapter.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| CrosstraderError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: format!("{value} is not a valid count"),
    })
}

pub fn build_indicator_config(adapter: &dyn ConfigPort) -> Result<IndicatorConfig, CrosstraderError> {
    Ok(IndicatorConfig {
        short_period: get_usize(adapter, "indicators", "short_period", macd::DEFAULT_SHORT)?,
        long_period: get_usize(adapter, "indicators", "long_period", macd::DEFAULT_LONG)?,
        signal_period: get_usize(adapter, "indicators", "signal_period", macd::DEFAULT_SIGNAL)?,
        williams_period: get_usize(
            adapter,
            "indicators",
            "williams_period",
            williams_r::DEFAULT_PERIOD,
        )?,
    })
}

pub fn build_signal_config(adapter: &dyn ConfigPort) -> Result<SignalConfig, CrosstraderError> {
    let window = adapter
        .get_non_empty("signals", "window")
        .map(|s| {
            s.parse::<usize>().map_err(|_| CrosstraderError::ConfigInvalid {
                section: "signals".into(),
                key: "window".into(),
                reason: format!("'{s}' is not a valid count"),
            })
        })
        .transpose()?;

    Ok(SignalConfig {
        range_filter: adapter.get_bool("signals", "range_filter", true),
        oversold: adapter.get_double("signals", "oversold", DEFAULT_OVERSOLD),
        overbought: adapter.get_double("signals", "overbought", DEFAULT_OVERBOUGHT),
        window,
    })
}

pub fn build_simulation_config(
    adapter: &dyn ConfigPort,
) -> Result<SimulationConfig, CrosstraderError> {
    let defaults = SimulationConfig::default();
    Ok(SimulationConfig {
        cash: adapter.get_double("simulation", "cash", defaults.cash),
        shares: get_usize(adapter, "simulation", "shares", defaults.shares as usize)? as u64,
        commission: adapter.get_double("simulation", "commission", defaults.commission),
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, CrosstraderError> {
    Ok(BacktestConfig {
        indicators: build_indicator_config(adapter)?,
        signals: build_signal_config(adapter)?,
        simulation: build_simulation_config(adapter)?,
        assume_initial_position: adapter.get_bool("report", "assume_initial_position", true),
    })
}

/// `--data` when given, otherwise `[data] path`.
pub fn resolve_data_path(
    data_override: Option<&Path>,
    adapter: &dyn ConfigPort,
) -> Result<PathBuf, CrosstraderError> {
    if let Some(path) = data_override {
        return Ok(path.to_path_buf());
    }
    adapter
        .get_non_empty("data", "path")
        .map(PathBuf::from)
        .ok_or_else(|| CrosstraderError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })
}

pub fn build_data_adapter(
    data_override: Option<&Path>,
    adapter: &dyn ConfigPort,
) -> Result<CsvAdapter, CrosstraderError> {
    let path = resolve_data_path(data_override, adapter)?;
    let date_format = adapter
        .get_non_empty("data", "date_format")
        .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
    Ok(CsvAdapter::new(path).with_date_format(&date_format))
}

pub fn load_store(data_port: &dyn DataPort) -> Result<TimeSeriesStore, CrosstraderError> {
    let store = TimeSeriesStore::new(data_port.fetch_prices(None, None)?);
    if store.is_empty() {
        return Err(CrosstraderError::EmptySeries);
    }
    Ok(store)
}

fn run_analyze(
    config_path: &Path,
    data_override: Option<&Path>,
    window_override: Option<usize>,
    ledger_override: Option<PathBuf>,
) -> Result<(), CrosstraderError> {
    let adapter = load_config(config_path)?;
    let mut config = build_backtest_config(&adapter)?;
    if window_override.is_some() {
        config.signals.window = window_override;
    }

    let store = load_store(&build_data_adapter(data_override, &adapter)?)?;
    let result = run_backtest(&store, &config)?;
    print_summary(&store, &config, &result);

    let ledger_path =
        ledger_override.or_else(|| adapter.get_non_empty("report", "ledger_path").map(PathBuf::from));
    if let Some(path) = ledger_path {
        CsvLedgerAdapter::new(path.clone()).write_ledger(&result.report.result.ledger)?;
        println!("\nLedger written to: {}", path.display());
    }
    Ok(())
}

fn format_valuation(v: &Valuation) -> String {
    format!(
        "{}  cash {:.2}, shares {} @ {:.2}, total {:.2}",
        v.date, v.state.cash, v.state.shares, v.price, v.total
    )
}

pub fn print_summary(store: &TimeSeriesStore, config: &BacktestConfig, result: &BacktestResult) {
    let report = &result.report;
    let window_points = store
        .index_of(result.window_start)
        .map_or(store.len(), |i| store.len() - i);

    println!("=== {} ===", config.indicators);
    println!(
        "Window:         {} to {} ({} points)",
        result.window_start, report.end.date, window_points
    );
    println!(
        "Signals:        {} buys, {} sells{}",
        result.signals.buy_dates.len(),
        result.signals.sell_dates.len(),
        if config.signals.range_filter {
            format!(
                " (Williams %R below {} / above {})",
                config.signals.oversold, config.signals.overbought
            )
        } else {
            String::new()
        }
    );

    println!("\n=== Portfolio ===");
    println!("Start:          {}", format_valuation(&report.start));
    println!("Hold:           {}", format_valuation(&report.hold));
    println!("Final:          {}", format_valuation(&report.end));
    println!(
        "Actions:        {} ({} with effect)",
        report.result.action_count,
        report.result.ledger.len()
    );
    match report.total_return() {
        Some(ret) => println!("Return:         {:.2}%", ret * 100.0),
        None => println!("Return:         n/a"),
    }

    if !result.round_trips.is_empty() {
        println!("\n=== Round Trips (per share) ===");
        for trip in &result.round_trips {
            println!(
                "  {} @ {:>9.2}  ->  {} @ {:>9.2}  {:>+9.2}",
                trip.buy_date, trip.buy_price, trip.sell_date, trip.sell_price, trip.benefit()
            );
        }
        let summary = BenefitSummary::from_trips(&result.round_trips);
        println!(
            "  {} trips, {:.1}% wins, total {:+.2}",
            summary.trips,
            summary.win_rate() * 100.0,
            summary.total_benefit
        );
    }
}

fn compute_bundle(
    adapter: &dyn ConfigPort,
    store: &TimeSeriesStore,
) -> Result<IndicatorBundle, CrosstraderError> {
    let indicator_config = build_indicator_config(adapter)?;
    if store.len() < indicator_config.min_points() {
        warn!(
            points = store.len(),
            needed = indicator_config.min_points(),
            "not enough data for one MACD/signal pair"
        );
    }
    IndicatorEngine::new(indicator_config).compute(store)
}

/// "n/a" for a flat window or a date before the first full window.
fn format_williams(bundle: &IndicatorBundle, date: NaiveDate) -> String {
    match bundle.williams_r.value_at(date) {
        Ok(value) => format!("{value:.2}"),
        Err(_) => "n/a".to_string(),
    }
}

fn run_signals(
    config_path: &Path,
    data_override: Option<&Path>,
    unfiltered: bool,
) -> Result<(), CrosstraderError> {
    let adapter = load_config(config_path)?;
    let mut signal_config = build_signal_config(&adapter)?;
    if unfiltered {
        signal_config.range_filter = false;
    }

    let store = load_store(&build_data_adapter(data_override, &adapter)?)?;
    let bundle = compute_bundle(&adapter, &store)?;
    let signals: Signals = SignalDetector::new(signal_config).detect(&bundle)?;

    println!("{:<10}  {:<4}  {:>10}  {:>8}", "date", "op", "close", "%R");
    for action in signals.actions() {
        println!(
            "{:<10}  {:<4}  {:>10.2}  {:>8}",
            action.date,
            action.kind,
            store.price_at(action.date)?,
            format_williams(&bundle, action.date)
        );
    }
    println!(
        "\n{} buys, {} sells",
        signals.buy_dates.len(),
        signals.sell_dates.len()
    );
    Ok(())
}

fn run_indicators(
    config_path: &Path,
    data_override: Option<&Path>,
    last: usize,
) -> Result<(), CrosstraderError> {
    let adapter = load_config(config_path)?;
    let store = load_store(&build_data_adapter(data_override, &adapter)?)?;
    let bundle = compute_bundle(&adapter, &store)?;

    let histogram = bundle.macd.histogram();
    let skip = bundle.macd.len().saturating_sub(last);

    println!(
        "{:<10}  {:>10}  {:>10}  {:>10}  {:>10}  {:>8}",
        "date", "close", "macd", "signal", "histogram", "%R"
    );
    for (i, date) in bundle.macd.dates.iter().enumerate().skip(skip) {
        println!(
            "{:<10}  {:>10.2}  {:>10.4}  {:>10.4}  {:>10.4}  {:>8}",
            date,
            store.price_at(*date)?,
            bundle.macd.macd[i],
            bundle.macd.signal[i],
            histogram[i],
            format_williams(&bundle, *date)
        );
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), CrosstraderError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    let config = build_backtest_config(&adapter)?;
    config.indicators.validate()?;
    config.signals.validate()?;

    let data_adapter = build_data_adapter(None, &adapter)?;
    let store = load_store(&data_adapter)?;

    println!("Indicators:     {}", config.indicators);
    println!(
        "Signals:        range filter {}, oversold {}, overbought {}, window {}",
        if config.signals.range_filter { "on" } else { "off" },
        config.signals.oversold,
        config.signals.overbought,
        config
            .signals
            .window
            .map_or_else(|| "all".to_string(), |w| w.to_string())
    );
    println!(
        "Simulation:     cash {:.2}, shares {}, commission {}",
        config.simulation.cash, config.simulation.shares, config.simulation.commission
    );
    println!(
        "Data:           {} ({} points)",
        data_adapter.path().display(),
        store.len()
    );

    let needed = config.indicators.min_points();
    if store.len() < needed {
        return Err(CrosstraderError::InvalidPeriod {
            period: needed,
            len: store.len(),
        });
    }

    println!("\nConfiguration is valid.");
    Ok(())
}

fn run_info(config_path: &Path, data_override: Option<&Path>) -> Result<(), CrosstraderError> {
    let adapter = load_config(config_path)?;
    let data_adapter = build_data_adapter(data_override, &adapter)?;

    match data_adapter.get_data_range()? {
        Some((first, last, count)) => println!(
            "{}: {} points, {} to {}",
            data_adapter.path().display(),
            count,
            first,
            last
        ),
        None => println!("{}: no data found", data_adapter.path().display()),
    }
    Ok(())
}
