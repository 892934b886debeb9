//! Plain-text report adapter for terminal output.

use crate::domain::backtest::{BacktestResult, BacktestSummary};
use crate::domain::error::WarroomError;
use crate::domain::scoring::ScoreResult;
use crate::ports::report_port::{ReportPort, ScanRow};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportAdapter;

fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:+.2}%", v),
        None => "-".to_string(),
    }
}

impl ReportPort for TextReportAdapter {
    fn write_score(
        &self,
        out: &mut dyn Write,
        code: &str,
        close: f64,
        result: &ScoreResult,
    ) -> Result<(), WarroomError> {
        writeln!(out, "== {} ==", code)?;
        writeln!(out, "Close:     {:.2}", close)?;
        writeln!(out, "Score:     {:+}", result.score)?;
        writeln!(out, "Decision:  {}", result.decision)?;
        match result.stop_loss {
            Some(stop) => writeln!(out, "Stop-loss: {:.2}", stop)?,
            None => writeln!(out, "Stop-loss: -")?,
        }

        if !result.breakdown.is_empty() {
            writeln!(out, "Breakdown:")?;
            for (label, delta) in &result.breakdown {
                writeln!(out, "  {:<24} {:+}", label, delta)?;
            }
        }

        if !result.rationale.is_empty() {
            writeln!(out, "Rationale:")?;
            for finding in &result.rationale {
                let marker = if finding.actionable { "*" } else { "-" };
                writeln!(out, "  {} {}", marker, finding.text)?;
            }
        }
        Ok(())
    }

    fn write_backtest(
        &self,
        out: &mut dyn Write,
        code: &str,
        result: &BacktestResult,
        summary: &BacktestSummary,
    ) -> Result<(), WarroomError> {
        writeln!(
            out,
            "== {} backtest: {} cutoffs, {} trades ==",
            code,
            result.evaluations.len(),
            summary.trades
        )?;

        if !result.trades.is_empty() {
            writeln!(
                out,
                "{:<12} {:<12} {:>6} {:>10} {:>9} {:>9} {:>9}",
                "signal", "entry", "score", "price", "+5", "+10", "+20"
            )?;
            for t in &result.trades {
                writeln!(
                    out,
                    "{:<12} {:<12} {:>6} {:>10.2} {:>9} {:>9} {:>9}",
                    t.signal_date.to_string(),
                    t.entry_date.to_string(),
                    t.score,
                    t.entry_price,
                    fmt_pct(t.return_5),
                    fmt_pct(t.return_10),
                    fmt_pct(t.return_20)
                )?;
            }
        }

        writeln!(out, "Win rate:    {:.1}%", summary.win_rate * 100.0)?;
        writeln!(out, "Avg +5 bar:  {}", fmt_pct(summary.avg_return_5))?;
        writeln!(out, "Avg +10 bar: {}", fmt_pct(summary.avg_return_10))?;
        writeln!(out, "Avg +20 bar: {}", fmt_pct(summary.avg_return_20))?;
        Ok(())
    }

    /// Ranked one-line-per-code table, highest score first.
    fn write_scan(&self, out: &mut dyn Write, rows: &[ScanRow]) -> Result<(), WarroomError> {
        let mut ranked: Vec<&ScanRow> = rows.iter().collect();
        ranked.sort_by(|a, b| b.result.score.cmp(&a.result.score).then(a.code.cmp(&b.code)));

        writeln!(
            out,
            "{:<8} {:>10} {:>6} {:<11} {:>10}",
            "code", "close", "score", "decision", "stop"
        )?;
        for row in ranked {
            let stop = row
                .result
                .stop_loss
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                out,
                "{:<8} {:>10.2} {:>6} {:<11} {:>10}",
                row.code,
                row.close,
                row.result.score,
                row.result.decision.to_string(),
                stop
            )?;
        }
        Ok(())
    }
}
