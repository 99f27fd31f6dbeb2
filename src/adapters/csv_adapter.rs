//! CSV file data adapter.
//!
//! Expects a header row followed by `date,open,high,low,close,volume`. Dates
//! may be ISO (`2024-01-15`) or US style (`01/15/2024`).

use crate::domain::error::BreakoutError;
use crate::domain::ohlcv::Bar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, BreakoutError> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| BreakoutError::Data {
            reason: format!("invalid date format: {value}"),
        })
}

fn parse_field(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, BreakoutError> {
    record
        .get(idx)
        .ok_or_else(|| BreakoutError::Data {
            reason: format!("missing {name} column"),
        })?
        .trim()
        .parse()
        .map_err(|e| BreakoutError::Data {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self) -> Result<Vec<Bar>, BreakoutError> {
        let content = fs::read_to_string(&self.path)?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| BreakoutError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date = parse_date(record.get(0).ok_or_else(|| BreakoutError::Data {
                reason: "missing date column".into(),
            })?)?;

            bars.push(Bar {
                date,
                open: parse_field(&record, 1, "open")?,
                high: parse_field(&record, 2, "high")?,
                low: parse_field(&record, 3, "low")?,
                close: parse_field(&record, 4, "close")?,
                volume: parse_field(&record, 5, "volume")?,
            });
        }

        bars.sort_by_key(|b| b.date);
        if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(BreakoutError::Data {
                reason: format!("duplicate bar for {}", pair[0].date),
            });
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("BTC.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn fetch_bars_returns_correct_data() {
        let (_dir, path) = write_csv(
            "date,open,high,low,close,volume\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000.5\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[1].volume, 60000.5);
    }

    #[test]
    fn accepts_us_style_dates_and_sorts() {
        let (_dir, path) = write_csv(
            "datetime,open,high,low,close,volume\n\
             01/17/2024,3,3,3,3,1\n\
             01/16/2024,2,2,2,2,1\n",
        );
        let bars = CsvAdapter::new(path).fetch_bars().unwrap();
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
        assert_eq!(bars[1].close, 3.0);
    }

    #[test]
    fn duplicate_dates_rejected() {
        let (_dir, path) = write_csv(
            "date,open,high,low,close,volume\n\
             2024-01-15,1,1,1,1,1\n\
             2024-01-15,2,2,2,2,1\n",
        );
        let err = CsvAdapter::new(path).fetch_bars().unwrap_err();
        assert!(err.to_string().contains("duplicate bar for 2024-01-15"));
    }

    #[test]
    fn bad_number_reports_column() {
        let (_dir, path) = write_csv("date,open,high,low,close,volume\n2024-01-15,1,x,1,1,1\n");
        let err = CsvAdapter::new(path).fetch_bars().unwrap_err();
        assert!(err.to_string().contains("invalid high value"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let adapter = CsvAdapter::new(PathBuf::from("/nonexistent/bars.csv"));
        assert!(matches!(adapter.fetch_bars(), Err(BreakoutError::Io(_))));
    }

    #[test]
    fn data_range_summarizes_series() {
        let (_dir, path) = write_csv(
            "date,open,high,low,close,volume\n\
             2024-01-15,1,1,1,1,1\n\
             2024-01-20,1,1,1,1,1\n\
             2024-01-18,1,1,1,1,1\n",
        );
        let range = CsvAdapter::new(path).data_range().unwrap();
        assert_eq!(
            range,
            Some((
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 20).unwrap(),
                3
            ))
        );
    }

    #[test]
    fn header_only_is_empty() {
        let (_dir, path) = write_csv("date,open,high,low,close,volume\n");
        let adapter = CsvAdapter::new(path);
        assert!(adapter.fetch_bars().unwrap().is_empty());
        assert_eq!(adapter.data_range().unwrap(), None);
    }
}
