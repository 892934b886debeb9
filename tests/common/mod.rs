#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use warroom::domain::error::WarroomError;
pub use warroom::domain::ohlcv::OhlcvBar;
use warroom::domain::overlay::Overlays;
use warroom::domain::quote::LiveQuote;
use warroom::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub quotes: HashMap<String, LiveQuote>,
    pub overlays: HashMap<String, Overlays>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            quotes: HashMap::new(),
            overlays: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_quote(mut self, code: &str, quote: LiveQuote) -> Self {
        self.quotes.insert(code.to_string(), quote);
        self
    }

    pub fn with_overlays(mut self, code: &str, overlays: Overlays) -> Self {
        self.overlays.insert(code.to_string(), overlays);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }

    fn check(&self, code: &str) -> Result<(), WarroomError> {
        match self.errors.get(code) {
            Some(reason) => Err(WarroomError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, WarroomError> {
        self.check(code)?;
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_quote(&self, code: &str) -> Result<Option<LiveQuote>, WarroomError> {
        self.check(code)?;
        Ok(self.quotes.get(code).cloned())
    }

    fn fetch_overlays(&self, code: &str, _start_date: NaiveDate) -> Result<Overlays, WarroomError> {
        self.check(code)?;
        Ok(self.overlays.get(code).cloned().unwrap_or_default())
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, WarroomError> {
        self.check(code)?;
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bar on `start + offset` days: open at the close, one point either side.
pub fn make_bar(start: NaiveDate, offset: usize, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: start + chrono::Duration::days(offset as i64),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

pub fn bars_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(start, i, c))
        .collect()
}

/// Ten falling bars, a long flat base at 100, then a jump to 103 at index 60
/// followed by a steady climb.
pub fn breakout_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..10).map(|i| 200.0 - 10.0 * i as f64).collect();
    closes.extend(std::iter::repeat_n(100.0, 50));
    closes.push(103.0);
    closes.extend((1..=9).map(|i| 103.0 + i as f64));
    closes
}

/// A deterministic wave with drift, long enough to exercise every indicator.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.15 * t + 8.0 * (t / 7.0).sin() + 3.0 * (t / 2.3).cos()
        })
        .collect()
}

pub fn write_bar_csv(dir: &std::path::Path, code: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    std::fs::write(dir.join(format!("{code}.csv")), content).unwrap();
}
