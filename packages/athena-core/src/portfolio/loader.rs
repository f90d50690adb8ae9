//! Portfolio file loading.
//!
//! The file is CSV with at least `ticker`, `quantity` and `cost_basis`
//! columns. Headers are matched case-insensitively after trimming; other
//! columns are ignored.

use crate::types::Position;
use crate::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every portfolio file must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["ticker", "quantity", "cost_basis"];

/// Load positions from a CSV file on disk.
pub fn load_positions(path: &Path) -> Result<Vec<Position>> {
    let file = File::open(path)?;
    let positions = parse_positions(file)?;
    tracing::debug!(path = %path.display(), count = positions.len(), "loaded portfolio");
    Ok(positions)
}

/// Parse positions from CSV text.
///
/// Fails with [`Error::MissingColumns`] before reading any row when a
/// required column is absent, and with [`Error::InvalidRecord`] on the first
/// bad row (rows numbered from 1, header excluded).
pub fn parse_positions<R: Read>(reader: R) -> Result<Vec<Position>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| column(name).is_none())
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing));
    }

    // Checked above
    let (Some(ticker_idx), Some(quantity_idx), Some(cost_idx)) =
        (column("ticker"), column("quantity"), column("cost_basis"))
    else {
        return Err(Error::MissingColumns(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        ));
    };

    let mut positions = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let ticker = field(ticker_idx);
        if ticker.is_empty() {
            return Err(Error::InvalidRecord {
                row,
                field: "ticker",
                value: ticker.to_string(),
            });
        }

        let quantity = parse_number(field(quantity_idx), row, "quantity")?;
        let cost_basis = parse_number(field(cost_idx), row, "cost_basis")?;

        positions.push(Position::new(ticker, quantity, cost_basis));
    }

    Ok(positions)
}

fn parse_number(raw: &str, row: usize, field: &'static str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidRecord {
            row,
            field,
            value: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_normalizes_headers_and_tickers() {
        let csv = " Ticker ,QUANTITY, Cost_Basis ,note\n aapl ,10,150.5,core\nmsft,-2,300,\n";
        let positions = parse_positions(csv.as_bytes()).unwrap();

        assert_eq!(
            positions,
            vec![
                Position::new("AAPL", 10.0, 150.5),
                Position::new("MSFT", -2.0, 300.0),
            ]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let csv = "ticker,quantity,cost_basis\nAAPL,1,10\naapl,2,20\n";
        let positions = parse_positions(csv.as_bytes()).unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[1].ticker, "AAPL");
    }

    #[test]
    fn test_missing_columns_listed() {
        let csv = "ticker,shares\nAAPL,10\n";
        let err = parse_positions(csv.as_bytes()).unwrap_err();

        match err {
            Error::MissingColumns(cols) => {
                assert_eq!(cols, vec!["quantity".to_string(), "cost_basis".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_columns_message() {
        let err = parse_positions("symbol\nAAPL\n".as_bytes()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Portfolio file is missing required columns: ticker, quantity, cost_basis"
        );
    }

    #[test]
    fn test_bad_quantity_reports_row() {
        let csv = "ticker,quantity,cost_basis\nAAPL,10,1\nMSFT,ten,1\n";
        let err = parse_positions(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidRecord { row: 2, field: "quantity", ref value } if value == "ten"
        ));
    }

    #[test]
    fn test_empty_ticker_rejected() {
        let csv = "ticker,quantity,cost_basis\n ,10,1\n";
        assert!(matches!(
            parse_positions(csv.as_bytes()),
            Err(Error::InvalidRecord { field: "ticker", .. })
        ));
    }

    #[test]
    fn test_header_only_is_empty_portfolio() {
        let positions = parse_positions("ticker,quantity,cost_basis\n".as_bytes()).unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn test_load_positions_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "ticker,quantity,cost_basis").unwrap();
        writeln!(file, "nvda,3,400").unwrap();

        let positions = load_positions(file.path()).unwrap();
        assert_eq!(positions, vec![Position::new("NVDA", 3.0, 400.0)]);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_positions(&dir.path().join("missing.csv"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
