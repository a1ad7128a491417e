//! Configuration validation.
//!
//! Checks every numeric setting before a run so a bad INI file fails with
//! the offending `[section] key` instead of a downstream indicator error.
//!
//! The typed getters fall back to defaults on unparseable text, so value
//! types are checked against the raw strings first.

use crate::domain::error::CrosstraderError;
use crate::domain::indicator::macd::{self, DEFAULT_LONG, DEFAULT_SHORT, DEFAULT_SIGNAL};
use crate::domain::indicator::williams_r;
use crate::domain::signal::{DEFAULT_OVERBOUGHT, DEFAULT_OVERSOLD};
use crate::ports::config_port::{parse_bool, ConfigPort};

pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Integer,
    Float,
    Bool,
}

const TYPED_KEYS: [(&str, &str, ValueKind); 11] = [
    ("indicators", "short_period", ValueKind::Integer),
    ("indicators", "long_period", ValueKind::Integer),
    ("indicators", "signal_period", ValueKind::Integer),
    ("indicators", "williams_period", ValueKind::Integer),
    ("signals", "range_filter", ValueKind::Bool),
    ("signals", "oversold", ValueKind::Float),
    ("signals", "overbought", ValueKind::Float),
    ("simulation", "cash", ValueKind::Float),
    ("simulation", "shares", ValueKind::Integer),
    ("simulation", "commission", ValueKind::Float),
    ("report", "assume_initial_position", ValueKind::Bool),
];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    validate_value_types(config)?;
    validate_indicator_periods(config)?;
    validate_thresholds(config)?;
    validate_window(config)?;
    validate_starting_position(config)?;
    validate_commission(config)?;
    validate_log_level(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> CrosstraderError {
    CrosstraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_value_types(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    for (section, key, kind) in TYPED_KEYS {
        let Some(raw) = config.get_non_empty(section, key) else {
            continue;
        };
        let parses = match kind {
            ValueKind::Integer => raw.parse::<i64>().is_ok(),
            ValueKind::Float => raw.parse::<f64>().is_ok(),
            ValueKind::Bool => parse_bool(&raw).is_some(),
        };
        if !parses {
            let expected = match kind {
                ValueKind::Integer => "an integer",
                ValueKind::Float => "a number",
                ValueKind::Bool => "true/false, yes/no, on/off or 1/0",
            };
            return Err(invalid(
                section,
                key,
                format!("'{raw}' is not {expected}"),
            ));
        }
    }
    Ok(())
}

fn validate_indicator_periods(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    let periods = [
        ("short_period", DEFAULT_SHORT),
        ("long_period", DEFAULT_LONG),
        ("signal_period", DEFAULT_SIGNAL),
        ("williams_period", williams_r::DEFAULT_PERIOD),
    ];
    for (key, default) in periods {
        let value = config.get_int("indicators", key, default as i64);
        if value <= 0 {
            return Err(invalid("indicators", key, format!("{key} must be positive")));
        }
    }

    let short = config.get_int("indicators", "short_period", DEFAULT_SHORT as i64);
    let long = config.get_int("indicators", "long_period", DEFAULT_LONG as i64);
    if short >= long {
        return Err(invalid(
            "indicators",
            "short_period",
            "short_period must be less than long_period",
        ));
    }

    let signal = config.get_int("indicators", "signal_period", DEFAULT_SIGNAL as i64);
    let williams = config.get_int(
        "indicators",
        "williams_period",
        williams_r::DEFAULT_PERIOD as i64,
    );
    let warmup = macd::warmup(long as usize, signal as usize);
    if williams as usize > warmup {
        return Err(invalid(
            "indicators",
            "williams_period",
            format!("williams_period must not exceed long_period + signal_period - 2 ({warmup})"),
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    let oversold = config.get_double("signals", "oversold", DEFAULT_OVERSOLD);
    let overbought = config.get_double("signals", "overbought", DEFAULT_OVERBOUGHT);

    for (key, value) in [("oversold", oversold), ("overbought", overbought)] {
        if !(-100.0..=0.0).contains(&value) {
            return Err(invalid(
                "signals",
                key,
                format!("{key} must be between -100 and 0"),
            ));
        }
    }
    if oversold >= overbought {
        return Err(invalid(
            "signals",
            "oversold",
            "oversold must be below overbought",
        ));
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    match config.get_string("signals", "window") {
        None => Ok(()),
        Some(s) if s.trim().is_empty() => Ok(()),
        Some(s) => match s.trim().parse::<usize>() {
            Ok(n) if n >= 2 => Ok(()),
            _ => Err(invalid(
                "signals",
                "window",
                "window must be an integer of at least 2",
            )),
        },
    }
}

fn validate_starting_position(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    let cash = config.get_double("simulation", "cash", 0.0);
    if !cash.is_finite() || cash < 0.0 {
        return Err(invalid("simulation", "cash", "cash must be non-negative"));
    }
    let shares = config.get_int("simulation", "shares", 0);
    if shares < 0 {
        return Err(invalid("simulation", "shares", "shares must be non-negative"));
    }
    Ok(())
}

fn validate_commission(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    let value = config.get_double("simulation", "commission", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "simulation",
            "commission",
            "commission must be in [0, 1)",
        ));
    }
    Ok(())
}

fn validate_log_level(config: &dyn ConfigPort) -> Result<(), CrosstraderError> {
    match config.get_string("logging", "level") {
        None => Ok(()),
        Some(level) if LOG_LEVELS.contains(&level.to_lowercase().as_str()) => Ok(()),
        Some(level) => Err(invalid(
            "logging",
            "level",
            format!("unknown level '{level}', expected one of {}", LOG_LEVELS.join(", ")),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid(content: &str, section: &str, key: &str) {
        match validate_config(&adapter(content)) {
            Err(CrosstraderError::ConfigInvalid {
                section: s, key: k, ..
            }) => {
                assert_eq!(s, section);
                assert_eq!(k, key);
            }
            other => panic!("expected ConfigInvalid [{section}] {key}, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_uses_valid_defaults() {
        assert!(validate_config(&adapter("[data]\n")).is_ok());
    }

    #[test]
    fn full_config_is_valid() {
        let content = r#"
[indicators]
short_period = 5
long_period = 20
signal_period = 5
williams_period = 10

[signals]
oversold = -80
overbought = -20
window = 250

[simulation]
cash = 1000
shares = 0
commission = 0.001

[logging]
level = DEBUG
"#;
        assert!(validate_config(&adapter(content)).is_ok());
    }

    #[test]
    fn rejects_inverted_macd_periods() {
        assert_invalid(
            "[indicators]\nshort_period = 26\nlong_period = 12\n",
            "indicators",
            "short_period",
        );
    }

    #[test]
    fn rejects_zero_period() {
        assert_invalid("[indicators]\nsignal_period = 0\n", "indicators", "signal_period");
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        assert_invalid("[signals]\noverbought = 10\n", "signals", "overbought");
    }

    #[test]
    fn rejects_inverted_thresholds() {
        assert_invalid(
            "[signals]\noversold = -20\noverbought = -80\n",
            "signals",
            "oversold",
        );
    }

    #[test]
    fn rejects_bad_window() {
        assert_invalid("[signals]\nwindow = 1\n", "signals", "window");
        assert_invalid("[signals]\nwindow = lots\n", "signals", "window");
    }

    #[test]
    fn rejects_negative_cash_and_shares() {
        assert_invalid("[simulation]\ncash = -1\n", "simulation", "cash");
        assert_invalid("[simulation]\nshares = -5\n", "simulation", "shares");
    }

    #[test]
    fn rejects_commission_of_one() {
        assert_invalid("[simulation]\ncommission = 1.0\n", "simulation", "commission");
    }

    #[test]
    fn rejects_unparseable_integer() {
        assert_invalid("[indicators]\nshort_period = twelve\n", "indicators", "short_period");
        assert_invalid("[simulation]\nshares = 2.5\n", "simulation", "shares");
    }

    #[test]
    fn rejects_unparseable_float() {
        assert_invalid("[simulation]\ncommission = 1%\n", "simulation", "commission");
        assert_invalid("[signals]\noversold = low\n", "signals", "oversold");
    }

    #[test]
    fn rejects_unparseable_bool() {
        assert_invalid("[signals]\nrange_filter = maybe\n", "signals", "range_filter");
        assert_invalid(
            "[report]\nassume_initial_position = sometimes\n",
            "report",
            "assume_initial_position",
        );
    }

    #[test]
    fn blank_typed_value_uses_default() {
        assert!(validate_config(&adapter("[simulation]\ncommission =\n")).is_ok());
    }

    #[test]
    fn rejects_williams_period_beyond_macd_warmup() {
        assert_invalid(
            "[indicators]\nwilliams_period = 60\n",
            "indicators",
            "williams_period",
        );
        assert!(validate_config(&adapter("[indicators]\nwilliams_period = 33\n")).is_ok());
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert_invalid("[logging]\nlevel = loud\n", "logging", "level");
    }
}
