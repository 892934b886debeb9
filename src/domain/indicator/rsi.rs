//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss:
//! - First average: simple mean of gains/losses over the first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are invalid (need n price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::wilder_smooth;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let (gains, losses): (Vec<Option<f64>>, Vec<Option<f64>>) = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                return (None, None);
            }
            let change = bar.close - bars[i - 1].close;
            (Some(change.max(0.0)), Some((-change).max(0.0)))
        })
        .unzip();

    let avg_gain = wilder_smooth(&gains, period);
    let avg_loss = wilder_smooth(&losses, period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let rsi = match (avg_gain[i], avg_loss[i]) {
                (Some(_), Some(loss)) if loss == 0.0 => Some(100.0),
                (Some(gain), Some(loss)) => Some(100.0 - 100.0 / (1.0 + gain / loss)),
                _ => None,
            };
            IndicatorPoint::simple(bar.date, rsi)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
