#![allow(dead_code)]

use chrono::NaiveDate;
use crosstrader::domain::error::CrosstraderError;
pub use crosstrader::domain::price::PricePoint;
use crosstrader::domain::series::TimeSeriesStore;
use crosstrader::ports::data_port::DataPort;
use std::io::Write;

/// In-memory price source; returns its points filtered like the CSV loader.
pub struct MockDataPort {
    pub points: Vec<PricePoint>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self {
            points,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            points: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, CrosstraderError> {
        if let Some(reason) = &self.error {
            return Err(CrosstraderError::DataLoad {
                reason: reason.clone(),
            });
        }
        Ok(self
            .points
            .iter()
            .filter(|p| start_date.is_none_or(|s| p.date >= s))
            .filter(|p| end_date.is_none_or(|e| p.date <= e))
            .copied()
            .collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn day(offset: usize) -> NaiveDate {
    date(2023, 1, 2) + chrono::Duration::days(offset as i64)
}

pub fn make_point(offset: usize, close: f64) -> PricePoint {
    PricePoint::new(day(offset), close, close + 1.0, close - 1.0)
}

/// Closes following a slow sine wave so MACD crosses its signal line
/// repeatedly and Williams %R swings through both thresholds.
pub fn wave_points(n: usize) -> Vec<PricePoint> {
    (0..n)
        .map(|i| {
            let close = 100.0 + 20.0 * (i as f64 / 8.0).sin();
            make_point(i, close)
        })
        .collect()
}

pub fn wave_store(n: usize) -> TimeSeriesStore {
    TimeSeriesStore::new(wave_points(n))
}

pub fn constant_store(n: usize, close: f64) -> TimeSeriesStore {
    TimeSeriesStore::new(
        (0..n)
            .map(|i| PricePoint::new(day(i), close, close, close))
            .collect(),
    )
}

pub fn points_to_csv(points: &[PricePoint]) -> String {
    let mut out = String::from("Date,Open,High,Low,Close,Volume\n");
    for p in points {
        out.push_str(&format!(
            "{},{},{},{},{},1000\n",
            p.date, p.close, p.high, p.low, p.close
        ));
    }
    out
}

pub fn write_temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
