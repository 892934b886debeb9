//! Scoring rule weights and decision thresholds.
//!
//! Defaults reproduce the canonical rule table. Every value can be overridden
//! from the `[scoring]` config section; see `cli::build_scoring_config`.

/// Signed score delta contributed by each rule when it fires.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleWeights {
    pub revenue_growth: i32,
    pub revenue_decline: i32,
    pub above_trend_ma: i32,
    pub below_trend_ma: i32,
    pub trend_ma_falling: i32,
    pub golden_cross: i32,
    pub golden_cross_low: i32,
    pub below_ma60: i32,
    pub below_ma60_low: i32,
    pub climactic_selloff: i32,
    pub bearish_engulfing: i32,
    pub kd_cross_up: i32,
    pub kd_cross_up_bearish: i32,
    pub kd_cross_down: i32,
    pub macd_turn_up: i32,
    pub breakout: i32,
    pub breakout_high: i32,
    pub bollinger_break: i32,
    /// Connected institutional buying at a high price position.
    pub connected_buy_high: i32,
    /// Connected buying while BIAS_20 is stretched.
    pub connected_buy_stretched: i32,
    pub connected_buy: i32,
    pub ignition: i32,
    pub first_inflow: i32,
    pub outflow: i32,
    pub margin_heavy: i32,
    pub margin_elevated: i32,
    pub divergent_positioning: i32,
    pub falling_knife: i32,
    pub obv_confirm: i32,
    pub volume_divergence: i32,
    pub no_trend: i32,
    pub trend_strengthening: i32,
    pub overheated: i32,
    pub hot: i32,
    pub oversold: i32,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            revenue_growth: 1,
            revenue_decline: -1,
            above_trend_ma: 2,
            below_trend_ma: -2,
            trend_ma_falling: -1,
            golden_cross: 3,
            golden_cross_low: 4,
            below_ma60: -3,
            below_ma60_low: -1,
            climactic_selloff: -4,
            bearish_engulfing: -2,
            kd_cross_up: 2,
            kd_cross_up_bearish: 1,
            kd_cross_down: -2,
            macd_turn_up: 2,
            breakout: 3,
            breakout_high: 2,
            bollinger_break: 2,
            connected_buy_high: 1,
            connected_buy_stretched: 2,
            connected_buy: 3,
            ignition: 3,
            first_inflow: 1,
            outflow: -3,
            margin_heavy: -3,
            margin_elevated: -1,
            divergent_positioning: -3,
            falling_knife: -3,
            obv_confirm: 1,
            volume_divergence: -1,
            no_trend: -2,
            trend_strengthening: 1,
            overheated: -3,
            hot: -2,
            oversold: 1,
        }
    }
}

/// Comparison levels the rules test against, plus the decision bands.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringThresholds {
    pub strong_buy_score: i32,
    pub bullish_score: i32,
    pub sell_score: i32,
    /// Revenue YoY beyond ± this percentage fires the fundamental filter.
    pub revenue_yoy_pct: f64,
    pub low_position: f64,
    pub high_position: f64,
    pub climactic_drop_pct: f64,
    pub climactic_volume_mult: f64,
    pub kd_cross_up_below: f64,
    pub kd_cross_down_above: f64,
    pub connected_buy_bias: f64,
    pub large_outflow_lots: f64,
    pub margin_heavy_pct: f64,
    pub margin_elevated_pct: f64,
    pub foreign_sell_lots: f64,
    pub margin_jump_lots: f64,
    pub volume_divergence_ratio: f64,
    pub adx_no_trend: f64,
    pub adx_trending: f64,
    pub adx_strong: f64,
    pub bias_overheated: f64,
    pub bias_hot: f64,
    pub bias_oversold: f64,
    pub stop_atr_mult: f64,
    /// Clamp the running total at 0 when the no-trend penalty applies.
    pub floor_no_trend_penalty: bool,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            strong_buy_score: 6,
            bullish_score: 2,
            sell_score: -3,
            revenue_yoy_pct: 20.0,
            low_position: 20.0,
            high_position: 85.0,
            climactic_drop_pct: 3.0,
            climactic_volume_mult: 2.0,
            kd_cross_up_below: 50.0,
            kd_cross_down_above: 80.0,
            connected_buy_bias: 10.0,
            large_outflow_lots: 500.0,
            margin_heavy_pct: 60.0,
            margin_elevated_pct: 40.0,
            foreign_sell_lots: 1000.0,
            margin_jump_lots: 500.0,
            volume_divergence_ratio: 0.8,
            adx_no_trend: 20.0,
            adx_trending: 25.0,
            adx_strong: 30.0,
            bias_overheated: 18.0,
            bias_hot: 15.0,
            bias_oversold: -12.0,
            stop_atr_mult: 2.0,
            floor_no_trend_penalty: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringConfig {
    pub weights: RuleWeights,
    pub thresholds: ScoringThresholds,
}

impl ScoringConfig {
    /// Older engine variant: flat connected-buy bonus and a floored no-trend penalty.
    pub fn flat_variant() -> Self {
        let mut config = Self::default();
        config.weights.connected_buy_high = config.weights.connected_buy;
        config.weights.connected_buy_stretched = config.weights.connected_buy;
        config.thresholds.floor_no_trend_penalty = true;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_table() {
        let config = ScoringConfig::default();
        assert_eq!(config.weights.golden_cross_low, 4);
        assert_eq!(config.weights.climactic_selloff, -4);
        assert_eq!(config.thresholds.strong_buy_score, 6);
        assert_eq!(config.thresholds.sell_score, -3);
        assert!(!config.thresholds.floor_no_trend_penalty);
    }

    #[test]
    fn flat_variant_uses_single_connected_buy_weight() {
        let config = ScoringConfig::flat_variant();
        assert_eq!(config.weights.connected_buy_high, 3);
        assert_eq!(config.weights.connected_buy_stretched, 3);
        assert!(config.thresholds.floor_no_trend_penalty);
    }
}
