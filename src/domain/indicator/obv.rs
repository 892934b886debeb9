//! OBV (On-Balance Volume) indicator.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

/// Calculate OBV (On-Balance Volume).
///
/// OBV[0] = volume[0]
/// If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
/// If close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
/// If close[i] == close[i-1]: OBV[i] = OBV[i-1]
///
/// No warmup period; all bars are valid.
pub fn calculate_obv(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut obv = 0.0;
    let mut prev_close: Option<f64> = None;

    for bar in bars {
        let volume = bar.volume as f64;
        obv = match prev_close {
            None => volume,
            Some(prev) if bar.close > prev => obv + volume,
            Some(prev) if bar.close < prev => obv - volume,
            Some(_) => obv,
        };
        prev_close = Some(bar.close);

        values.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorValue::Simple(obv),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Obv,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bar(date: &str, close: f64, volume: u64) -> OhlcvBar {
        OhlcvBar::flat(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            close,
            volume,
        )
    }

    #[test]
    fn obv_first_bar_is_volume() {
        let bars = vec![make_bar("2024-01-02", 100.0, 5000)];
        let series = calculate_obv(&bars);
        assert_eq!(series.simple_at(0), Some(5000.0));
    }

    #[test]
    fn obv_accumulates_by_direction() {
        let bars = vec![
            make_bar("2024-01-02", 100.0, 1000),
            make_bar("2024-01-03", 101.0, 500),
            make_bar("2024-01-04", 99.0, 300),
            make_bar("2024-01-05", 99.0, 800),
        ];
        let series = calculate_obv(&bars);
        assert_eq!(
            series.simple_values(),
            vec![Some(1000.0), Some(1500.0), Some(1200.0), Some(1200.0)]
        );
    }

    #[test]
    fn obv_can_go_negative() {
        let bars = vec![
            make_bar("2024-01-02", 100.0, 100),
            make_bar("2024-01-03", 90.0, 1000),
        ];
        let series = calculate_obv(&bars);
        assert_eq!(series.simple_at(1), Some(-900.0));
    }

    #[test]
    fn obv_empty() {
        assert!(calculate_obv(&[]).values.is_empty());
    }
}
