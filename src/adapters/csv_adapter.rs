//! CSV file data adapter.
//!
//! One directory holds every instrument:
//! - `{code}.csv`: date,open,high,low,close,volume
//! - `{code}_quote.csv`: price,change,change_percent then up to five
//!   `bidN,bidN_volume,askN,askN_volume` groups, best first (last row wins)
//! - `{code}_flow.csv`: date,institutional,foreign
//! - `{code}_margin.csv`: date,balance,limit
//! - `{code}_revenue.csv`: date,yoy
//!
//! Only the bar file is required; a missing auxiliary file means "no data".
//! Margin and revenue keep their latest report before the start date, since
//! those levels carry forward into the window.

use crate::domain::error::WarroomError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::overlay::{FlowPoint, MarginPoint, Overlays, RevenuePoint};
use crate::domain::quote::{BookLevel, LiveQuote};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, suffix: &str) -> PathBuf {
        self.base_path.join(format!("{}{}.csv", code, suffix))
    }

    /// File content, or `None` when the file does not exist.
    fn read_optional(&self, code: &str, suffix: &str) -> Result<Option<String>, WarroomError> {
        let path = self.csv_path(code, suffix);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WarroomError::data(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn read_bars(&self, code: &str) -> Result<Vec<OhlcvBar>, WarroomError> {
        let content = self
            .read_optional(code, "")?
            .ok_or_else(|| WarroomError::NoData {
                code: code.to_string(),
            })?;

        // keyed by date so duplicate rows collapse to the last one
        let mut bars = BTreeMap::new();
        for record in records(&content)? {
            let date = parse_date(&record)?;
            bars.insert(
                date,
                OhlcvBar {
                    date,
                    open: field(&record, 1, "open")?,
                    high: field(&record, 2, "high")?,
                    low: field(&record, 3, "low")?,
                    close: field(&record, 4, "close")?,
                    volume: field(&record, 5, "volume")?,
                },
            );
        }
        Ok(bars.into_values().collect())
    }
}

fn records(content: &str) -> Result<Vec<csv::StringRecord>, WarroomError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    rdr.records()
        .map(|r| r.map_err(|e| WarroomError::data(format!("CSV parse error: {}", e))))
        .collect()
}

fn field<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, WarroomError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| WarroomError::data(format!("missing {} column", name)))?
        .parse()
        .map_err(|e| WarroomError::data(format!("invalid {} value: {}", name, e)))
}

/// Order-book levels start after price, change and change_percent.
const BOOK_OFFSET: usize = 3;
const BOOK_DEPTH: usize = 5;

/// Bid and ask levels from a quote row; a level with an empty price ends that side.
fn book_levels(record: &csv::StringRecord) -> Result<(Vec<BookLevel>, Vec<BookLevel>), WarroomError> {
    let mut bids = Vec::new();
    let mut asks = Vec::new();
    let (mut bids_done, mut asks_done) = (false, false);
    for level in 0..BOOK_DEPTH {
        let base = BOOK_OFFSET + level * 4;
        for (side, done, offset) in [(&mut bids, &mut bids_done, 0), (&mut asks, &mut asks_done, 2)] {
            if *done {
                continue;
            }
            match record.get(base + offset) {
                Some(price) if !price.is_empty() => side.push(BookLevel {
                    price: field(record, base + offset, "book price")?,
                    volume: field(record, base + offset + 1, "book volume")?,
                }),
                _ => *done = true,
            }
        }
    }
    Ok((bids, asks))
}

/// Rows on or after `start_date`, plus the latest row before it.
fn with_carry_in<T>(mut rows: Vec<(NaiveDate, T)>, start_date: NaiveDate) -> Vec<T> {
    rows.sort_by_key(|(date, _)| *date);
    let first_in_window = rows.partition_point(|(date, _)| *date < start_date);
    rows.into_iter()
        .skip(first_in_window.saturating_sub(1))
        .map(|(_, row)| row)
        .collect()
}

fn parse_date(record: &csv::StringRecord) -> Result<NaiveDate, WarroomError> {
    let raw = record
        .get(0)
        .ok_or_else(|| WarroomError::data("missing date column"))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| WarroomError::data(format!("invalid date format: {}", e)))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, WarroomError> {
        let mut bars = self.read_bars(code)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn fetch_quote(&self, code: &str) -> Result<Option<LiveQuote>, WarroomError> {
        let Some(content) = self.read_optional(code, "_quote")? else {
            return Ok(None);
        };
        let Some(record) = records(&content)?.pop() else {
            return Ok(None);
        };
        let (bids, asks) = book_levels(&record)?;
        Ok(Some(LiveQuote {
            price: field(&record, 0, "price")?,
            change: field(&record, 1, "change")?,
            change_percent: field(&record, 2, "change_percent")?,
            bids,
            asks,
        }))
    }

    fn fetch_overlays(&self, code: &str, start_date: NaiveDate) -> Result<Overlays, WarroomError> {
        let mut overlays = Overlays::default();

        if let Some(content) = self.read_optional(code, "_flow")? {
            for record in records(&content)? {
                let date = parse_date(&record)?;
                if date >= start_date {
                    overlays.flows.push(FlowPoint {
                        date,
                        institutional: field(&record, 1, "institutional")?,
                        foreign: field(&record, 2, "foreign")?,
                    });
                }
            }
        }

        if let Some(content) = self.read_optional(code, "_margin")? {
            let mut rows = Vec::new();
            for record in records(&content)? {
                let date = parse_date(&record)?;
                let point = MarginPoint {
                    date,
                    balance: field(&record, 1, "balance")?,
                    limit: field(&record, 2, "limit")?,
                };
                rows.push((date, point));
            }
            overlays.margin = with_carry_in(rows, start_date);
        }

        if let Some(content) = self.read_optional(code, "_revenue")? {
            let mut rows = Vec::new();
            for record in records(&content)? {
                let date = parse_date(&record)?;
                let point = RevenuePoint {
                    date,
                    yoy_pct: field(&record, 1, "yoy")?,
                };
                rows.push((date, point));
            }
            overlays.revenue = with_carry_in(rows, start_date);
        }

        Ok(overlays)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, WarroomError> {
        let bars = match self.read_bars(code) {
            Ok(bars) => bars,
            Err(WarroomError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
