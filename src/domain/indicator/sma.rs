//! Simple Moving Average of close.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::rolling_mean;
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    let means = rolling_mean(&closes, period);

    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: bars
            .iter()
            .zip(means)
            .map(|(bar, v)| IndicatorPoint::simple(bar.date, v))
            .collect(),
    }
}
