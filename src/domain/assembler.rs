//! Bar series assembly: folding a live quote into history and resampling.
//!
//! Both operations preserve the series invariant: dates are unique and
//! strictly increasing.

use crate::domain::ohlcv::{is_well_ordered, OhlcvBar};
use crate::domain::quote::LiveQuote;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    /// Name of the trend moving average shown in rationale text.
    pub fn trend_ma_label(&self) -> &'static str {
        match self {
            Period::Daily => "monthly MA",
            Period::Weekly | Period::Monthly => "MA20",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Daily => write!(f, "daily"),
            Period::Weekly => write!(f, "weekly"),
            Period::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" => Ok(Period::Daily),
            "weekly" | "w" => Ok(Period::Weekly),
            "monthly" | "m" => Ok(Period::Monthly),
            other => Err(format!("unknown period '{other}'")),
        }
    }
}

/// Trading-calendar date of `now` in the instrument's exchange timezone.
///
/// Hosts usually run in UTC; a Taipei session that opened at 09:00 local is
/// still "yesterday" in UTC, so the conversion must happen before comparing
/// against bar dates.
pub fn session_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Fold a live quote into the latest bar.
///
/// A quote dated after the last bar opens a new flat bar with zero volume.
/// Otherwise the last bar's close is replaced and its high/low widened; open
/// and volume are never touched.
pub fn merge(history: Vec<OhlcvBar>, quote: Option<&LiveQuote>, as_of: NaiveDate) -> Vec<OhlcvBar> {
    let Some(quote) = quote else {
        return history;
    };
    let mut bars = history;
    let Some(last) = bars.last_mut() else {
        return bars;
    };

    if last.date < as_of {
        tracing::debug!(%as_of, price = quote.price, "opening new session bar");
        bars.push(OhlcvBar::flat(as_of, quote.price, 0));
    } else {
        last.close = quote.price;
        last.high = last.high.max(quote.price);
        last.low = last.low.min(quote.price);
    }
    bars
}

/// Aggregate daily bars into coarser periods.
///
/// Weekly buckets end on Friday, monthly buckets on the last calendar day;
/// each output bar carries its bucket's end date. Input that violates the
/// ordering invariant is returned unchanged.
pub fn resample(bars: &[OhlcvBar], period: Period) -> Vec<OhlcvBar> {
    if period == Period::Daily {
        return bars.to_vec();
    }
    if !is_well_ordered(bars) {
        tracing::warn!(%period, "bar dates out of order, skipping resample");
        return bars.to_vec();
    }

    let mut out: Vec<OhlcvBar> = Vec::new();
    for bar in bars {
        let Some(bucket) = bucket_end(bar.date, period) else {
            tracing::warn!(%period, date = %bar.date, "no bucket for date, skipping resample");
            return bars.to_vec();
        };
        match out.last_mut() {
            Some(agg) if agg.date == bucket => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => out.push(OhlcvBar {
                date: bucket,
                ..bar.clone()
            }),
        }
    }
    out
}

fn bucket_end(date: NaiveDate, period: Period) -> Option<NaiveDate> {
    match period {
        Period::Daily => Some(date),
        Period::Weekly => {
            let from_monday = date.weekday().num_days_from_monday() as i64;
            let friday = Weekday::Fri.num_days_from_monday() as i64;
            let ahead = (friday - from_monday).rem_euclid(7);
            date.checked_add_signed(Duration::days(ahead))
        }
        Period::Monthly => {
            let (year, month) = if date.month() == 12 {
                (date.year() + 1, 1)
            } else {
                (date.year(), date.month() + 1)
            };
            NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
        }
    }
}
