//! ADX (Average Directional Index, Wilder).
//!
//! 1. +DM / -DM from consecutive bars
//! 2. Wilder-smooth +DM, -DM and TR over n
//! 3. +DI = 100 × sm(+DM) / sm(TR), -DI likewise
//! 4. DX = 100 × |+DI - -DI| / (+DI + -DI), 0 when both DIs are 0
//! 5. ADX = Wilder-smoothed DX
//!
//! Directional movement starts at bar 1, so with n=14 the first ADX value
//! lands on index 2n - 1 = 27.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::indicator_helpers::{true_ranges, wilder_smooth};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_adx(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    let n = bars.len();
    let mut plus_dm = vec![None; n];
    let mut minus_dm = vec![None; n];
    let mut tr = vec![None; n];

    let ranges = true_ranges(bars);
    for i in 1..n {
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        plus_dm[i] = Some(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm[i] = Some(if down > up && down > 0.0 { down } else { 0.0 });
        tr[i] = Some(ranges[i]);
    }

    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);

    let dx: Vec<Option<f64>> = (0..n)
        .map(|i| {
            let tr = smooth_tr[i].filter(|v| *v > 0.0)?;
            let plus_di = 100.0 * smooth_plus[i]? / tr;
            let minus_di = 100.0 * smooth_minus[i]? / tr;
            let sum = plus_di + minus_di;
            Some(if sum == 0.0 {
                0.0
            } else {
                100.0 * (plus_di - minus_di).abs() / sum
            })
        })
        .collect();
    let adx = wilder_smooth(&dx, period);

    IndicatorSeries {
        indicator_type: IndicatorType::Adx(period),
        values: bars
            .iter()
            .zip(adx)
            .map(|(bar, v)| IndicatorPoint::simple(bar.date, v))
            .collect(),
    }
}
