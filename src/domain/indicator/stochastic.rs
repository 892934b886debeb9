//! Stochastic oscillator (KD).
//!
//! raw %K = 100 × (C - LL(n)) / (HH(n) - LL(n)), undefined on a zero range.
//! K = SMA(smooth_k) of raw %K, D = SMA(d_period) of K.
//! Default parameters: n=9, smoothing 3/3, so the first valid point is index 12.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::indicator_helpers::{rolling_max, rolling_mean, rolling_min};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_K_PERIOD: usize = 9;
pub const DEFAULT_SMOOTH: usize = 3;

pub fn calculate_stochastic(
    bars: &[OhlcvBar],
    k_period: usize,
    d_period: usize,
    smooth_k: usize,
) -> IndicatorSeries {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let hh = rolling_max(&highs, k_period);
    let ll = rolling_min(&lows, k_period);

    let raw: Vec<Option<f64>> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let (high, low) = (hh[i]?, ll[i]?);
            let range = high - low;
            (range > 0.0).then(|| 100.0 * (bar.close - low) / range)
        })
        .collect();
    let k = rolling_mean(&raw, smooth_k);
    let d = rolling_mean(&k, d_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (k[i], d[i]) {
            (Some(k), Some(d)) => IndicatorPoint {
                date: bar.date,
                valid: true,
                value: IndicatorValue::Stochastic { k, d },
            },
            _ => IndicatorPoint::invalid(bar.date, IndicatorValue::Stochastic { k: 0.0, d: 0.0 }),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Stochastic {
            k_period,
            d_period,
            smooth_k,
        },
        values,
    }
}

pub fn calculate_stochastic_default(bars: &[OhlcvBar]) -> IndicatorSeries {
    calculate_stochastic(bars, DEFAULT_K_PERIOD, DEFAULT_SMOOTH, DEFAULT_SMOOTH)
}

/// Split a stochastic series into K and D columns.
pub fn kd_values(series: &IndicatorSeries) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    (0..series.values.len())
        .map(|i| match series.get(i) {
            Some(IndicatorValue::Stochastic { k, d }) => (Some(*k), Some(*d)),
            _ => (None, None),
        })
        .unzip()
}
