//! Rule-based scoring engine.
//!
//! Rules read the last bar of an enriched series plus up to two bars before
//! it, in a fixed order:
//!
//! 1. fundamental filter (revenue YoY)
//! 2. positioning context (low/high flags, not scored)
//! 3. trend (period MA, MA slope, golden cross, MA60)
//! 4. pattern risk (climactic sell-off, bearish engulfing)
//! 5. momentum (KD cross, MACD histogram turn)
//! 6. breakout (Donchian, Bollinger upper band)
//! 7. institutional and margin flow
//! 8. volume confirmation (OBV, price/volume divergence)
//! 9. volatility regime (ADX)
//! 10. deviation risk (BIAS_20)
//! 11. stop-loss
//!
//! Order matters: the no-trend penalty can be floored against the running
//! total, and ignition depends on whether the breakout rule fired. A rule whose
//! inputs are undefined is skipped.

use crate::domain::assembler::Period;
use crate::domain::enriched::EnrichedBar;
use crate::domain::error::WarroomError;
use crate::domain::rule_weights::{ScoringConfig, ScoringThresholds};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    StrongBuy,
    Bullish,
    Hold,
    Sell,
}

impl Decision {
    pub fn classify(score: i32, thresholds: &ScoringThresholds) -> Self {
        if score >= thresholds.strong_buy_score {
            Decision::StrongBuy
        } else if score >= thresholds.bullish_score {
            Decision::Bullish
        } else if score <= thresholds.sell_score {
            Decision::Sell
        } else {
            Decision::Hold
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::StrongBuy => write!(f, "STRONG BUY"),
            Decision::Bullish => write!(f, "BULLISH"),
            Decision::Hold => write!(f, "HOLD"),
            Decision::Sell => write!(f, "SELL"),
        }
    }
}

/// One rationale line. Actionable findings are the ones worth a push alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub text: String,
    pub actionable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub score: i32,
    pub decision: Decision,
    pub rationale: Vec<Finding>,
    /// (rule label, signed delta) for every rule that changed the score.
    pub breakdown: Vec<(String, i32)>,
    pub stop_loss: Option<f64>,
}

impl ScoreResult {
    pub fn actionable(&self) -> impl Iterator<Item = &Finding> {
        self.rationale.iter().filter(|f| f.actionable)
    }

    pub fn delta_for(&self, label: &str) -> Option<i32> {
        self.breakdown
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, d)| *d)
    }
}

struct Scorecard {
    total: i32,
    rationale: Vec<Finding>,
    breakdown: Vec<(String, i32)>,
}

impl Scorecard {
    fn new() -> Self {
        Self {
            total: 0,
            rationale: Vec::new(),
            breakdown: Vec::new(),
        }
    }

    fn add(&mut self, label: &str, delta: i32, text: String) {
        self.push(label, delta, text, false);
    }

    fn add_actionable(&mut self, label: &str, delta: i32, text: String) {
        self.push(label, delta, text, true);
    }

    fn push(&mut self, label: &str, delta: i32, text: String, actionable: bool) {
        tracing::debug!(rule = label, delta, running = self.total + delta, "rule fired");
        self.total += delta;
        self.breakdown.push((label.to_string(), delta));
        self.rationale.push(Finding { text, actionable });
    }

    fn note(&mut self, text: String) {
        self.rationale.push(Finding {
            text,
            actionable: false,
        });
    }
}

/// Bars the rules look at: the latest one and up to two before it.
struct Window<'a> {
    curr: &'a EnrichedBar,
    prev: Option<&'a EnrichedBar>,
    prev2: Option<&'a EnrichedBar>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    low_position: bool,
    high_position: bool,
    breakout: bool,
}

/// Score the latest bar of `series`.
///
/// Returns `Err(EmptySeries)` for an empty series; the caller is expected to
/// check for missing history before scoring. Any non-empty series produces a
/// best-effort result.
pub fn score(
    series: &[EnrichedBar],
    period: Period,
    config: &ScoringConfig,
) -> Result<ScoreResult, WarroomError> {
    let n = series.len();
    let curr = series.last().ok_or(WarroomError::EmptySeries)?;
    let w = Window {
        curr,
        prev: n.checked_sub(2).map(|i| &series[i]),
        prev2: n.checked_sub(3).map(|i| &series[i]),
    };

    let mut card = Scorecard::new();
    let mut ctx = Context::default();

    fundamental(&w, config, &mut card);
    positioning(&w, config, &mut card, &mut ctx);
    trend(&w, period, config, &mut card, &ctx);
    pattern_risk(&w, config, &mut card);
    momentum(&w, config, &mut card, &ctx);
    breakout(&w, config, &mut card, &mut ctx);
    flow(&w, config, &mut card, &ctx);
    volume(&w, config, &mut card);
    volatility_regime(&w, config, &mut card);
    deviation(&w, config, &mut card);

    let stop_loss = curr
        .atr
        .map(|atr| curr.close() - config.thresholds.stop_atr_mult * atr);

    let decision = Decision::classify(card.total, &config.thresholds);
    tracing::debug!(score = card.total, %decision, date = %curr.bar.date, "scored");

    Ok(ScoreResult {
        score: card.total,
        decision,
        rationale: card.rationale,
        breakdown: card.breakdown,
        stop_loss,
    })
}

fn fundamental(w: &Window, config: &ScoringConfig, card: &mut Scorecard) {
    let Some(yoy) = w.curr.overlay.revenue_yoy else {
        return;
    };
    let limit = config.thresholds.revenue_yoy_pct;
    if yoy > limit {
        card.add(
            "revenue_growth",
            config.weights.revenue_growth,
            format!("Revenue up {yoy:.1}% YoY"),
        );
    } else if yoy < -limit {
        card.add(
            "revenue_decline",
            config.weights.revenue_decline,
            format!("Revenue down {:.1}% YoY", -yoy),
        );
    }
}

fn positioning(w: &Window, config: &ScoringConfig, card: &mut Scorecard, ctx: &mut Context) {
    let pos = w.curr.price_position;
    let t = &config.thresholds;
    if pos < t.low_position {
        ctx.low_position = true;
        card.note(format!("Low position ({pos:.0}% of 250-bar range)"));
    } else if pos > t.high_position {
        ctx.high_position = true;
        card.note(format!("High position ({pos:.0}% of 250-bar range)"));
    }
}

fn trend(w: &Window, period: Period, config: &ScoringConfig, card: &mut Scorecard, ctx: &Context) {
    let weights = &config.weights;
    let c = w.curr;
    let label = period.trend_ma_label();

    if let Some(ma20) = c.ma20 {
        if c.close() > ma20 {
            let reclaimed = w
                .prev
                .and_then(|p| p.ma20.map(|pma| p.close() <= pma))
                .unwrap_or(false);
            if reclaimed {
                card.add_actionable(
                    "above_trend_ma",
                    weights.above_trend_ma,
                    format!("Just reclaimed the {label}"),
                );
            } else {
                card.add(
                    "above_trend_ma",
                    weights.above_trend_ma,
                    format!("Holding above the {label}"),
                );
            }
        } else {
            card.add(
                "below_trend_ma",
                weights.below_trend_ma,
                format!("Below the {label}"),
            );
        }
    }

    if let Some(p) = w.prev {
        if let (Some(ma), Some(pma)) = (c.ma20, p.ma20) {
            if ma < pma {
                card.add(
                    "trend_ma_falling",
                    weights.trend_ma_falling,
                    format!("The {label} is turning down"),
                );
            }
        }

        if let (Some(fast), Some(slow), Some(pfast), Some(pslow)) = (c.ma5, c.ma20, p.ma5, p.ma20) {
            if fast > slow && pfast <= pslow {
                if ctx.low_position {
                    card.add_actionable(
                        "golden_cross",
                        weights.golden_cross_low,
                        "Golden cross (MA5 over MA20) from a low position".to_string(),
                    );
                } else {
                    card.add_actionable(
                        "golden_cross",
                        weights.golden_cross,
                        "Golden cross (MA5 over MA20)".to_string(),
                    );
                }
            }
        }
    }

    if let Some(ma60) = c.ma60 {
        if c.close() < ma60 {
            if ctx.low_position {
                card.add(
                    "below_ma60",
                    weights.below_ma60_low,
                    "Below MA60, already near cycle lows".to_string(),
                );
            } else {
                card.add(
                    "below_ma60",
                    weights.below_ma60,
                    "Broke below MA60".to_string(),
                );
            }
        }
    }
}

fn pattern_risk(w: &Window, config: &ScoringConfig, card: &mut Scorecard) {
    let Some(p) = w.prev else {
        return;
    };
    let c = w.curr;
    let t = &config.thresholds;

    if p.close() > 0.0 {
        let change_pct = (c.close() - p.close()) / p.close() * 100.0;
        let heavy = c
            .vol_ma5
            .map(|avg| c.bar.volume as f64 > t.climactic_volume_mult * avg)
            .unwrap_or(false);
        if change_pct < -t.climactic_drop_pct && heavy {
            card.add_actionable(
                "climactic_selloff",
                config.weights.climactic_selloff,
                format!("Climactic sell-off: {change_pct:.1}% on heavy volume"),
            );
        }
    }

    let engulfing = p.bar.is_bullish()
        && c.bar.is_bearish()
        && c.bar.open >= p.bar.close
        && c.bar.close <= p.bar.open;
    if engulfing {
        card.add(
            "bearish_engulfing",
            config.weights.bearish_engulfing,
            "Bearish engulfing".to_string(),
        );
    }
}

fn momentum(w: &Window, config: &ScoringConfig, card: &mut Scorecard, ctx: &Context) {
    let Some(p) = w.prev else {
        return;
    };
    let c = w.curr;
    let weights = &config.weights;
    let t = &config.thresholds;

    if let (Some(k), Some(d), Some(pk), Some(pd)) = (c.k, c.d, p.k, p.d) {
        if k > d && pk <= pd && k < t.kd_cross_up_below {
            let bearish_alignment = matches!((c.ma20, c.ma60), (Some(m20), Some(m60)) if m20 < m60);
            if bearish_alignment && !ctx.low_position {
                card.add(
                    "kd_cross_up",
                    weights.kd_cross_up_bearish,
                    format!("KD golden cross at {k:.0}, averages still bearish"),
                );
            } else {
                card.add(
                    "kd_cross_up",
                    weights.kd_cross_up,
                    format!("KD golden cross at {k:.0}"),
                );
            }
        } else if k < d && pk >= pd && k > t.kd_cross_down_above {
            card.add(
                "kd_cross_down",
                weights.kd_cross_down,
                format!("KD death cross at {k:.0}"),
            );
        }
    }

    if let (Some(hist), Some(phist)) = (c.macd_hist, p.macd_hist) {
        if phist <= 0.0 && hist > 0.0 {
            card.add(
                "macd_turn_up",
                weights.macd_turn_up,
                "MACD histogram turned positive".to_string(),
            );
        }
    }
}

fn breakout(w: &Window, config: &ScoringConfig, card: &mut Scorecard, ctx: &mut Context) {
    let c = w.curr;
    let weights = &config.weights;

    if let (Some(p), Some(high)) = (w.prev, c.donchian_high) {
        let fresh = p.donchian_high.map(|ph| p.close() <= ph).unwrap_or(false);
        if c.close() > high && fresh {
            ctx.breakout = true;
            let delta = if ctx.high_position {
                weights.breakout_high
            } else {
                weights.breakout
            };
            card.add_actionable(
                "breakout",
                delta,
                format!("Donchian breakout above {high:.2}"),
            );
        }
    }

    if let Some(upper) = c.bb_upper {
        if c.close() >= upper {
            card.add(
                "bollinger_break",
                weights.bollinger_break,
                "Riding the upper Bollinger band".to_string(),
            );
        }
    }
}

fn flow(w: &Window, config: &ScoringConfig, card: &mut Scorecard, ctx: &Context) {
    let c = w.curr;
    let weights = &config.weights;
    let t = &config.thresholds;
    let f0 = c.overlay.institutional_net;
    let f1 = w.prev.map(|p| p.overlay.institutional_net);
    let f2 = w.prev2.map(|p| p.overlay.institutional_net);

    match (f1, f2) {
        (Some(f1), Some(f2)) if f0 > 0.0 && f1 > 0.0 && f2 > 0.0 => {
            let (delta, text) = if ctx.high_position {
                (weights.connected_buy_high, "Institutions buying 3 days, but at a high position")
            } else if c.bias_20.map(|b| b > t.connected_buy_bias).unwrap_or(false) {
                (weights.connected_buy_stretched, "Institutions buying 3 days, price stretched")
            } else {
                (weights.connected_buy, "Institutions buying 3 days in a row")
            };
            card.add("connected_buy", delta, text.to_string());
        }
        (Some(f1), _) if f0 > 0.0 && f1 <= 0.0 => {
            if ctx.breakout {
                card.add_actionable(
                    "ignition",
                    weights.ignition,
                    format!("Ignition: institutions turn buyers ({f0:.0} lots) on a breakout"),
                );
            } else {
                card.add(
                    "first_inflow",
                    weights.first_inflow,
                    format!("Institutions turn buyers ({f0:.0} lots)"),
                );
            }
        }
        _ => {}
    }

    let sustained_selling = matches!((f1, f2), (Some(f1), Some(f2)) if f0 < 0.0 && f1 < 0.0 && f2 < 0.0);
    if sustained_selling || f0 < -t.large_outflow_lots {
        card.add(
            "outflow",
            weights.outflow,
            format!("Institutional selling ({f0:.0} lots)"),
        );
    }

    let util = c.margin_utilization;
    if util > t.margin_heavy_pct {
        card.add(
            "margin_heavy",
            weights.margin_heavy,
            format!("Margin utilization {util:.0}%"),
        );
    } else if util >= t.margin_elevated_pct {
        card.add(
            "margin_elevated",
            weights.margin_elevated,
            format!("Margin utilization {util:.0}%"),
        );
    }

    let Some(p) = w.prev else {
        return;
    };
    // a change needs a report on both bars; the first report is not an increase
    let (Some(balance), Some(prev_balance)) = (c.overlay.margin_balance, p.overlay.margin_balance)
    else {
        return;
    };
    let margin_change = balance - prev_balance;
    if c.overlay.foreign_net < -t.foreign_sell_lots && margin_change > t.margin_jump_lots {
        card.add(
            "divergent_positioning",
            weights.divergent_positioning,
            format!("Foreign selling while margin grows by {margin_change:.0} lots"),
        );
    }
    if let Some(ma20) = c.ma20 {
        if c.close() < ma20 && margin_change > 0.0 {
            card.add(
                "falling_knife",
                weights.falling_knife,
                "Margin rising while price sits below MA20".to_string(),
            );
        }
    }
}

fn volume(w: &Window, config: &ScoringConfig, card: &mut Scorecard) {
    let c = w.curr;
    if let (Some(obv), Some(obv_ma)) = (c.obv, c.obv_ma20) {
        if obv > obv_ma {
            card.add(
                "obv_confirm",
                config.weights.obv_confirm,
                "OBV above its 20-bar average".to_string(),
            );
        }
    }

    if let (Some(p), Some(avg)) = (w.prev, c.vol_ma5) {
        let thin = (c.bar.volume as f64) < config.thresholds.volume_divergence_ratio * avg;
        if c.close() > p.close() && thin {
            card.add(
                "volume_divergence",
                config.weights.volume_divergence,
                "Price up on thin volume".to_string(),
            );
        }
    }
}

fn volatility_regime(w: &Window, config: &ScoringConfig, card: &mut Scorecard) {
    let Some(adx) = w.curr.adx else {
        return;
    };
    let t = &config.thresholds;

    if adx < t.adx_no_trend {
        let text = format!("No trend (ADX {adx:.0})");
        if t.floor_no_trend_penalty {
            let floored = (card.total + config.weights.no_trend).max(0);
            let delta = floored - card.total;
            if delta != 0 {
                card.add("no_trend", delta, text);
            } else {
                card.note(text);
            }
        } else {
            card.add("no_trend", config.weights.no_trend, text);
        }
    } else if adx > t.adx_trending {
        let rising = w
            .prev
            .and_then(|p| p.adx)
            .map(|padx| adx > padx)
            .unwrap_or(false);
        if rising {
            card.add(
                "trend_strengthening",
                config.weights.trend_strengthening,
                format!("Trend strengthening (ADX {adx:.0})"),
            );
        }
    }
}

fn deviation(w: &Window, config: &ScoringConfig, card: &mut Scorecard) {
    let Some(bias) = w.curr.bias_20 else {
        return;
    };
    let t = &config.thresholds;
    let weights = &config.weights;

    if bias > t.bias_overheated {
        card.add(
            "overheated",
            weights.overheated,
            format!("Overheated: {bias:.1}% above MA20"),
        );
    } else if bias > t.bias_hot {
        let strong_trend = w.curr.adx.map(|a| a > t.adx_strong).unwrap_or(false);
        if strong_trend {
            card.note(format!("Stretched {bias:.1}% above MA20, strong trend exempt"));
        } else {
            card.add("hot", weights.hot, format!("Stretched {bias:.1}% above MA20"));
        }
    } else if bias < t.bias_oversold {
        card.add(
            "oversold",
            weights.oversold,
            format!("Oversold: {:.1}% below MA20", -bias),
        );
    }
}
