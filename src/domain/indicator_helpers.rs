//! Shared rolling-window math for indicator calculations.
//!
//! All helpers take index-aligned inputs and return index-aligned outputs, with
//! `None` marking positions that lack enough history.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

/// Simple mean over the trailing `period` values; `None` if any is missing.
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let sum = window.iter().copied().sum::<Option<f64>>()?;
            Some(sum / period as f64)
        })
        .collect()
}

/// Highest value over the trailing `period` values.
pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::max)
}

/// Lowest value over the trailing `period` values.
pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_fold(values, period, f64::min)
}

fn rolling_fold(values: &[f64], period: usize, f: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            values[i + 1 - period..=i].iter().copied().reduce(f)
        })
        .collect()
}

/// Exponential average with k = 2/(n+1), seeded by the SMA of the first `period`
/// defined values. A gap in the input restarts the seed.
pub fn ema_values(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let k = 2.0 / (period as f64 + 1.0);
    seeded_recursion(values, period, |prev, x| x * k + prev * (1.0 - k))
}

/// Wilder smoothing: seed with the mean of the first `period` defined values,
/// then avg = (prev * (n-1) + x) / n.
pub fn wilder_smooth(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = period as f64;
    seeded_recursion(values, period, |prev, x| (prev * (n - 1.0) + x) / n)
}

fn seeded_recursion(
    values: &[Option<f64>],
    period: usize,
    step: impl Fn(f64, f64) -> f64,
) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if period == 0 {
        out.resize(values.len(), None);
        return out;
    }

    let mut state: Option<f64> = None;
    let mut seed_sum = 0.0;
    let mut seed_count = 0usize;

    for value in values {
        let Some(x) = *value else {
            state = None;
            seed_sum = 0.0;
            seed_count = 0;
            out.push(None);
            continue;
        };
        state = match state {
            Some(prev) => Some(step(prev, x)),
            None => {
                seed_sum += x;
                seed_count += 1;
                (seed_count == period).then(|| seed_sum / period as f64)
            }
        };
        out.push(state);
    }
    out
}

/// True range per bar; the first bar uses high - low.
pub fn true_ranges(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

/// Average true range with Wilder smoothing.
pub fn calc_atr(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let tr: Vec<Option<f64>> = true_ranges(bars).into_iter().map(Some).collect();
    let atr = wilder_smooth(&tr, period);

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values: bars
            .iter()
            .zip(atr)
            .map(|(bar, v)| IndicatorPoint::simple(bar.date, v))
            .collect(),
    }
}
