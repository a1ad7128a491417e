//! CSV ledger export.

use crate::domain::error::CrosstraderError;
use crate::domain::simulation::LedgerRow;
use crate::ports::ledger_port::LedgerPort;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

pub const LEDGER_HEADER: [&str; 6] = [
    "date",
    "operation",
    "shares_delta",
    "price",
    "cash_after",
    "shares_after",
];

pub struct CsvLedgerAdapter {
    path: PathBuf,
}

impl CsvLedgerAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn ledger_error(e: impl std::fmt::Display) -> CrosstraderError {
    CrosstraderError::LedgerWrite {
        reason: e.to_string(),
    }
}

/// Writes the header and one record per row. An empty ledger still gets
/// the header line.
pub fn write_ledger_to<W: Write>(writer: W, rows: &[LedgerRow]) -> Result<(), CrosstraderError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(LEDGER_HEADER).map_err(ledger_error)?;
    for row in rows {
        wtr.write_record([
            row.date.format("%Y-%m-%d").to_string(),
            row.operation.to_string(),
            row.shares_delta.to_string(),
            format!("{:.4}", row.price),
            format!("{:.4}", row.cash_after),
            row.shares_after.to_string(),
        ])
        .map_err(ledger_error)?;
    }
    wtr.flush().map_err(ledger_error)
}

impl LedgerPort for CsvLedgerAdapter {
    fn write_ledger(&self, rows: &[LedgerRow]) -> Result<(), CrosstraderError> {
        let file = File::create(&self.path).map_err(|e| CrosstraderError::LedgerWrite {
            reason: format!("cannot create {}: {}", self.path.display(), e),
        })?;
        write_ledger_to(file, rows)?;
        info!(path = %self.path.display(), rows = rows.len(), "ledger written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::SignalKind;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn rows() -> Vec<LedgerRow> {
        vec![
            LedgerRow {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                operation: SignalKind::Buy,
                shares_delta: 10,
                price: 100.0,
                cash_after: 0.0,
                shares_after: 10,
            },
            LedgerRow {
                date: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
                operation: SignalKind::Sell,
                shares_delta: -10,
                price: 150.0,
                cash_after: 1500.0,
                shares_after: 0,
            },
        ]
    }

    #[test]
    fn writes_header_and_rows() {
        let mut buf = Vec::new();
        write_ledger_to(&mut buf, &rows()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "date,operation,shares_delta,price,cash_after,shares_after"
        );
        assert_eq!(lines[1], "2024-03-01,BUY,10,100.0000,0.0000,10");
        assert_eq!(lines[2], "2024-03-08,SELL,-10,150.0000,1500.0000,0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn empty_ledger_has_header_only() {
        let mut buf = Vec::new();
        write_ledger_to(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().lines().count(), 1);
    }

    #[test]
    fn file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        CsvLedgerAdapter::new(path.clone())
            .write_ledger(&rows())
            .unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, LEDGER_HEADER);
        assert_eq!(rdr.records().count(), 2);
    }

    #[test]
    fn unwritable_path_is_ledger_error() {
        let adapter = CsvLedgerAdapter::new(PathBuf::from("/nonexistent/dir/ledger.csv"));
        assert!(matches!(
            adapter.write_ledger(&rows()),
            Err(CrosstraderError::LedgerWrite { .. })
        ));
    }
}
