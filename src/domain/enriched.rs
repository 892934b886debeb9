//! Enriched bar series: each bar plus its derived indicator fields.
//!
//! `compute` is a pure function of its inputs. Every field at index `i` is
//! derived from bars `0..=i` only, so scoring a truncated series gives the same
//! values as scoring the prefix of a longer one.

use crate::domain::indicator::{
    adx, bollinger, calculate_adx, calculate_bollinger, calculate_donchian, calculate_obv,
    calculate_price_position, calculate_rsi, calculate_sma, calculate_stochastic, donchian, macd,
    price_position, rsi, stochastic,
};
use crate::domain::indicator_helpers::{calc_atr, rolling_mean};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::overlay::{OverlayPoint, Overlays};

pub const ATR_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBar {
    pub bar: OhlcvBar,
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub vol_ma5: Option<f64>,
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub macd_hist: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub bias_20: Option<f64>,
    pub donchian_high: Option<f64>,
    pub donchian_low: Option<f64>,
    pub atr: Option<f64>,
    pub obv: Option<f64>,
    pub obv_ma20: Option<f64>,
    pub adx: Option<f64>,
    pub rsi: Option<f64>,
    /// margin balance / margin limit × 100, or 0 without a limit.
    pub margin_utilization: f64,
    /// Always defined; 50 is the neutral fallback.
    pub price_position: f64,
    pub overlay: OverlayPoint,
}

impl EnrichedBar {
    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

/// Derive every indicator field for `bars`, aligning `overlays` by date.
pub fn compute(bars: &[OhlcvBar], overlays: Option<&Overlays>) -> Vec<EnrichedBar> {
    let volumes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.volume as f64)).collect();

    let ma5 = calculate_sma(bars, 5).simple_values();
    let ma10 = calculate_sma(bars, 10).simple_values();
    let ma20 = calculate_sma(bars, 20).simple_values();
    let ma60 = calculate_sma(bars, 60).simple_values();
    let vol_ma5 = rolling_mean(&volumes, 5);

    let (k, d) = stochastic::kd_values(&calculate_stochastic(
        bars,
        stochastic::DEFAULT_K_PERIOD,
        stochastic::DEFAULT_SMOOTH,
        stochastic::DEFAULT_SMOOTH,
    ));
    let macd_hist = macd::histogram_values(&macd::calculate_macd_default(bars));
    let (bb_upper, bb_lower) = bollinger::band_values(&calculate_bollinger(
        bars,
        bollinger::DEFAULT_PERIOD,
        bollinger::DEFAULT_MULT_X100,
    ));
    let (donchian_high, donchian_low) =
        donchian::channel_values(&calculate_donchian(bars, donchian::DEFAULT_PERIOD));
    let atr = calc_atr(bars, ATR_PERIOD).simple_values();
    let obv = calculate_obv(bars).simple_values();
    let obv_ma20 = rolling_mean(&obv, 20);
    let adx = calculate_adx(bars, adx::DEFAULT_PERIOD).simple_values();
    let rsi = calculate_rsi(bars, rsi::DEFAULT_PERIOD).simple_values();
    let position = calculate_price_position(
        bars,
        price_position::DEFAULT_LOOKBACK,
        price_position::DEFAULT_MIN_PERIODS,
    )
    .simple_values();

    let aligned = match overlays {
        Some(o) => o.align(bars),
        None => vec![OverlayPoint::default(); bars.len()],
    };

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let overlay = aligned[i];
            EnrichedBar {
                bar: bar.clone(),
                ma5: ma5[i],
                ma10: ma10[i],
                ma20: ma20[i],
                ma60: ma60[i],
                vol_ma5: vol_ma5[i],
                k: k[i],
                d: d[i],
                macd_hist: macd_hist[i],
                bb_upper: bb_upper[i],
                bb_lower: bb_lower[i],
                bias_20: ma20[i].and_then(|ma| bias(bar.close, ma)),
                donchian_high: donchian_high[i],
                donchian_low: donchian_low[i],
                atr: atr[i],
                obv: obv[i],
                obv_ma20: obv_ma20[i],
                adx: adx[i],
                rsi: rsi[i],
                margin_utilization: utilization(overlay.margin_balance.unwrap_or(0.0), overlay.margin_limit),
                price_position: position[i].unwrap_or(price_position::NEUTRAL),
                overlay,
            }
        })
        .collect()
}

fn bias(close: f64, ma: f64) -> Option<f64> {
    (ma != 0.0).then(|| (close - ma) / ma * 100.0)
}

fn utilization(balance: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        balance / limit * 100.0
    } else {
        0.0
    }
}
