//! CSV file price adapter.
//!
//! Reads a headered daily quote file such as
//! `Date,Open,High,Low,Close,Volume`. Columns are located by name
//! (case-insensitive), so extra columns and any column order are accepted.
//! Output is sorted by date with duplicate dates collapsed to the last row.

use crate::domain::error::CrosstraderError;
use crate::domain::price::PricePoint;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    path: PathBuf,
    date_format: String,
}

struct Columns {
    date: usize,
    close: usize,
    high: usize,
    low: usize,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn with_date_format(mut self, date_format: &str) -> Self {
        self.date_format = date_format.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, CrosstraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| CrosstraderError::DataLoad {
                    reason: format!("missing {} column", name.to_lowercase()),
                })
        };
        Ok(Columns {
            date: find("Date")?,
            close: find("Close")?,
            high: find("High")?,
            low: find("Low")?,
        })
    }

    fn parse_field(
        record: &csv::StringRecord,
        index: usize,
        name: &str,
        line: u64,
    ) -> Result<f64, CrosstraderError> {
        let raw = record.get(index).ok_or_else(|| CrosstraderError::DataLoad {
            reason: format!("line {line}: missing {name} value"),
        })?;
        let value: f64 = raw.trim().parse().map_err(|e| CrosstraderError::DataLoad {
            reason: format!("line {line}: invalid {name} value '{raw}': {e}"),
        })?;
        if !value.is_finite() {
            return Err(CrosstraderError::DataLoad {
                reason: format!("line {line}: non-finite {name} value '{raw}'"),
            });
        }
        Ok(value)
    }

    pub fn parse_prices(&self, content: &str) -> Result<Vec<PricePoint>, CrosstraderError> {
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| CrosstraderError::DataLoad {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Self::locate_columns(headers)?;

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| CrosstraderError::DataLoad {
                reason: format!("CSV parse error: {}", e),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let date_str = record
                .get(columns.date)
                .ok_or_else(|| CrosstraderError::DataLoad {
                    reason: format!("line {line}: missing date value"),
                })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), &self.date_format).map_err(
                |e| CrosstraderError::DataLoad {
                    reason: format!("line {line}: invalid date '{date_str}': {e}"),
                },
            )?;

            points.push(PricePoint {
                date,
                close: Self::parse_field(&record, columns.close, "close", line)?,
                high: Self::parse_field(&record, columns.high, "high", line)?,
                low: Self::parse_field(&record, columns.low, "low", line)?,
            });
        }

        Ok(sort_and_dedup(points))
    }
}

/// Stable sort by date, then keep the last row of each run of equal dates.
pub fn sort_and_dedup(mut points: Vec<PricePoint>) -> Vec<PricePoint> {
    points.sort_by_key(|p| p.date);

    let before = points.len();
    let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match deduped.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => deduped.push(point),
        }
    }
    if deduped.len() < before {
        warn!(
            dropped = before - deduped.len(),
            "duplicate dates in price data, keeping the last row for each"
        );
    }
    deduped
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PricePoint>, CrosstraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| CrosstraderError::DataLoad {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut points = self.parse_prices(&content)?;
        points.retain(|p| {
            start_date.is_none_or(|start| p.date >= start) && end_date.is_none_or(|end| p.date <= end)
        });

        debug!(path = %self.path.display(), points = points.len(), "loaded prices");
        Ok(points)
    }
}
