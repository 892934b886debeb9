//! Walk-forward backtest harness.
//!
//! For each cutoff `i` the engine scores `series[..=i]` only. A score at or
//! above the threshold opens a simulated trade at bar `i + 1`'s open, and
//! forward returns are measured from that entry. Cutoffs share no state, so
//! they are scored in parallel and collected back in order.

use crate::domain::assembler::Period;
use crate::domain::enriched::EnrichedBar;
use crate::domain::error::WarroomError;
use crate::domain::rule_weights::ScoringConfig;
use crate::domain::scoring::{score, Decision};
use chrono::NaiveDate;
use rayon::prelude::*;

/// Forward-return horizons in bars after entry.
pub const HORIZONS: [usize; 3] = [5, 10, 20];

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSettings {
    pub lookback_bars: usize,
    pub score_threshold: i32,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            lookback_bars: 120,
            score_threshold: 6,
        }
    }
}

/// The engine's verdict at one historical cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct CutoffEvaluation {
    pub index: usize,
    pub date: NaiveDate,
    pub score: i32,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeLog {
    pub signal_date: NaiveDate,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub score: i32,
    /// Percent returns at +5/+10/+20 bars; `None` past the end of the series.
    pub return_5: Option<f64>,
    pub return_10: Option<f64>,
    pub return_20: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub evaluations: Vec<CutoffEvaluation>,
    pub trades: Vec<TradeLog>,
}

/// Replay the scoring engine over the last `lookback_bars` cutoffs.
pub fn run_backtest(
    series: &[EnrichedBar],
    period: Period,
    settings: &BacktestSettings,
    config: &ScoringConfig,
) -> Result<BacktestResult, WarroomError> {
    let n = series.len();
    if n < 2 {
        return Ok(BacktestResult {
            evaluations: Vec::new(),
            trades: Vec::new(),
        });
    }
    let first = n.saturating_sub(settings.lookback_bars);
    let last = n - 2;

    let evaluations = (first..=last)
        .into_par_iter()
        .map(|i| {
            let result = score(&series[..=i], period, config)?;
            Ok(CutoffEvaluation {
                index: i,
                date: series[i].bar.date,
                score: result.score,
                decision: result.decision,
            })
        })
        .collect::<Result<Vec<_>, WarroomError>>()?;

    let trades = evaluations
        .iter()
        .filter(|e| e.score >= settings.score_threshold)
        .map(|e| open_trade(series, e))
        .collect();

    Ok(BacktestResult {
        evaluations,
        trades,
    })
}

fn open_trade(series: &[EnrichedBar], signal: &CutoffEvaluation) -> TradeLog {
    let entry_index = signal.index + 1;
    let entry = &series[entry_index].bar;
    let forward = |h: usize| {
        let exit = series.get(entry_index + h)?;
        (entry.open > 0.0).then(|| (exit.close() - entry.open) / entry.open * 100.0)
    };

    let trade = TradeLog {
        signal_date: signal.date,
        entry_index,
        entry_date: entry.date,
        entry_price: entry.open,
        score: signal.score,
        return_5: forward(HORIZONS[0]),
        return_10: forward(HORIZONS[1]),
        return_20: forward(HORIZONS[2]),
    };
    tracing::debug!(
        signal = %trade.signal_date,
        entry = %trade.entry_date,
        price = trade.entry_price,
        score = trade.score,
        return_5 = ?trade.return_5,
        "simulated trade"
    );
    trade
}

/// Aggregate hit-rate and average returns over a trade log.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    pub trades: usize,
    /// Trades whose 5-bar return is defined and positive.
    pub wins: usize,
    /// `wins / trades`; 0 when there are no trades.
    pub win_rate: f64,
    pub avg_return_5: Option<f64>,
    pub avg_return_10: Option<f64>,
    pub avg_return_20: Option<f64>,
}

impl BacktestSummary {
    pub fn compute(trades: &[TradeLog]) -> Self {
        let wins = trades
            .iter()
            .filter(|t| t.return_5.map(|r| r > 0.0).unwrap_or(false))
            .count();
        let win_rate = if trades.is_empty() {
            0.0
        } else {
            wins as f64 / trades.len() as f64
        };

        BacktestSummary {
            trades: trades.len(),
            wins,
            win_rate,
            avg_return_5: mean(trades.iter().filter_map(|t| t.return_5)),
            avg_return_10: mean(trades.iter().filter_map(|t| t.return_10)),
            avg_return_20: mean(trades.iter().filter_map(|t| t.return_20)),
        }
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}
