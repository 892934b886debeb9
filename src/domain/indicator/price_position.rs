//! Price position: where the close sits within the trailing high/low range.
//!
//! position = (C - LL) / (HH - LL) × 100 over the last min(lookback, i+1)
//! bars. Neutral 50 until `min_periods` bars exist or when the range is zero,
//! so every point is valid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_LOOKBACK: usize = 250;
pub const DEFAULT_MIN_PERIODS: usize = 60;
pub const NEUTRAL: f64 = 50.0;

pub fn calculate_price_position(
    bars: &[OhlcvBar],
    lookback: usize,
    min_periods: usize,
) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorValue::Simple(position_at(bars, i, lookback, min_periods)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::PricePosition {
            lookback,
            min_periods,
        },
        values,
    }
}

fn position_at(bars: &[OhlcvBar], i: usize, lookback: usize, min_periods: usize) -> f64 {
    let available = i + 1;
    if available < min_periods.max(1) {
        return NEUTRAL;
    }
    let window = &bars[available - available.min(lookback.max(1))..=i];
    let high = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let range = high - low;
    if !range.is_finite() || range <= 0.0 {
        return NEUTRAL;
    }
    let position = (bars[i].close - low) / range * 100.0;
    if position.is_finite() { position } else { NEUTRAL }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn constant_price_is_exactly_neutral() {
        let series = calculate_price_position(&make_bars(&[42.0; 300]), 250, 60);
        assert!(series.simple_values().iter().all(|v| *v == Some(50.0)));
    }

    #[test]
    fn short_history_is_neutral() {
        let closes: Vec<f64> = (0..59).map(|i| i as f64).collect();
        let series = calculate_price_position(&make_bars(&closes), 250, 60);
        assert_eq!(series.simple_at(58), Some(50.0));
    }

    #[test]
    fn position_at_top_and_bottom() {
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let series = calculate_price_position(&make_bars(&closes), 250, 60);
        assert_eq!(series.simple_at(59), Some(100.0));

        closes.push(100.0);
        let series = calculate_price_position(&make_bars(&closes), 250, 60);
        assert_eq!(series.simple_at(60), Some(0.0));
    }

    #[test]
    fn window_is_capped_at_lookback() {
        // an old spike drops out of a 3-bar window
        let series = calculate_price_position(&make_bars(&[500.0, 10.0, 20.0, 15.0]), 3, 1);
        assert_eq!(series.simple_at(3), Some(50.0));
    }
}
