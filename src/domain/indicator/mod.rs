//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Every calculator is causal: the point at index `i` reads bars `0..=i` only.

pub mod adx;
pub mod bollinger;
pub mod donchian;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod price_position;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use adx::calculate_adx;
pub use bollinger::calculate_bollinger;
pub use donchian::calculate_donchian;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use obv::calculate_obv;
pub use price_position::calculate_price_position;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::calculate_stochastic;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Channel {
        upper: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Obv,
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
        smooth_k: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Donchian(usize),
    PricePosition {
        lookback: usize,
        min_periods: usize,
    },
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// The value at `index`, or `None` during warmup or past the end.
    pub fn get(&self, index: usize) -> Option<&IndicatorValue> {
        self.values
            .get(index)
            .filter(|p| p.valid)
            .map(|p| &p.value)
    }

    /// Scalar value at `index` for single-valued indicators.
    pub fn simple_at(&self, index: usize) -> Option<f64> {
        match self.get(index)? {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }

    /// All scalar values in order, `None` where invalid.
    pub fn simple_values(&self) -> Vec<Option<f64>> {
        (0..self.values.len()).map(|i| self.simple_at(i)).collect()
    }
}

impl IndicatorPoint {
    pub(crate) fn invalid(date: NaiveDate, value: IndicatorValue) -> Self {
        Self {
            date,
            valid: false,
            value,
        }
    }

    /// A point that is valid only when the value is present and finite.
    pub(crate) fn simple(date: NaiveDate, value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Self {
                date,
                valid: true,
                value: IndicatorValue::Simple(v),
            },
            _ => Self::invalid(date, IndicatorValue::Simple(0.0)),
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Adx(period) => write!(f, "ADX({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic {
                k_period,
                d_period,
                smooth_k,
            } => {
                write!(f, "STOCHASTIC({},{},{})", k_period, d_period, smooth_k)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Donchian(period) => write!(f, "DONCHIAN({})", period),
            IndicatorType::PricePosition {
                lookback,
                min_periods,
            } => write!(f, "POSITION({},{})", lookback, min_periods),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 200,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2)");
    }

    #[test]
    fn indicator_type_display_stochastic() {
        let stoch = IndicatorType::Stochastic {
            k_period: 9,
            d_period: 3,
            smooth_k: 3,
        };
        assert_eq!(stoch.to_string(), "STOCHASTIC(9,3,3)");
    }

    #[test]
    fn simple_point_rejects_non_finite() {
        assert!(!IndicatorPoint::simple(date(), Some(f64::NAN)).valid);
        assert!(!IndicatorPoint::simple(date(), Some(f64::INFINITY)).valid);
        assert!(!IndicatorPoint::simple(date(), None).valid);
        assert!(IndicatorPoint::simple(date(), Some(1.5)).valid);
    }

    #[test]
    fn series_accessors_hide_invalid_points() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Sma(2),
            values: vec![
                IndicatorPoint::simple(date(), None),
                IndicatorPoint::simple(date(), Some(3.0)),
            ],
        };
        assert_eq!(series.simple_at(0), None);
        assert_eq!(series.simple_at(1), Some(3.0));
        assert_eq!(series.simple_at(2), None);
        assert_eq!(series.simple_values(), vec![None, Some(3.0)]);
    }
}
