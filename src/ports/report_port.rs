//! Report rendering port trait.

use crate::domain::backtest::{BacktestResult, BacktestSummary};
use crate::domain::error::WarroomError;
use crate::domain::scoring::ScoreResult;
use std::io::Write;

/// One scored instrument in a watchlist scan.
#[derive(Debug, Clone)]
pub struct ScanRow {
    pub code: String,
    pub close: f64,
    pub result: ScoreResult,
}

/// Port for rendering analysis results.
pub trait ReportPort {
    fn write_score(
        &self,
        out: &mut dyn Write,
        code: &str,
        close: f64,
        result: &ScoreResult,
    ) -> Result<(), WarroomError>;

    fn write_backtest(
        &self,
        out: &mut dyn Write,
        code: &str,
        result: &BacktestResult,
        summary: &BacktestSummary,
    ) -> Result<(), WarroomError>;

    /// Default implementation: one `write_score` block per row.
    fn write_scan(&self, out: &mut dyn Write, rows: &[ScanRow]) -> Result<(), WarroomError> {
        for row in rows {
            self.write_score(out, &row.code, row.close, &row.result)?;
        }
        Ok(())
    }
}
