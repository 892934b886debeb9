//! Donchian channel over the prior n bars.
//!
//! upper[i] = max(high[i-n..i]), lower[i] = min(low[i-n..i]); the current bar
//! is excluded so a breakout compares today's close against history only.
//! Warmup: first n bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 20;

pub fn calculate_donchian(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if period == 0 || i < period {
                return IndicatorPoint::invalid(
                    bar.date,
                    IndicatorValue::Channel {
                        upper: 0.0,
                        lower: 0.0,
                    },
                );
            }
            let window = &bars[i - period..i];
            let upper = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let lower = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Channel { upper, lower },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Donchian(period),
        values,
    }
}

/// Upper and lower channel values in bar order.
pub fn channel_values(series: &IndicatorSeries) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    (0..series.values.len())
        .map(|i| match series.get(i) {
            Some(IndicatorValue::Channel { upper, lower }) => (Some(*upper), Some(*lower)),
            _ => (None, None),
        })
        .unzip()
}
