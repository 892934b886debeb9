//! Notification digest: short text alerts built from actionable findings.
//!
//! Delivery is someone else's job; this module only formats the message.

use crate::domain::scoring::ScoreResult;
use chrono::NaiveDate;

const SEPARATOR: &str = "--------------------";

/// Alert body for one instrument, or `None` when nothing actionable fired.
pub fn format_alert(code: &str, result: &ScoreResult, close: f64) -> Option<String> {
    let lines: Vec<&str> = result.actionable().map(|f| f.text.as_str()).collect();
    if lines.is_empty() {
        return None;
    }

    let mut msg = format!("[{} signal] {}\n", code, result.decision);
    msg.push_str(&lines.join("\n"));
    msg.push_str(&format!("\nClose: {}", close));
    if let Some(stop) = result.stop_loss {
        msg.push_str(&format!("\nStop-loss: {:.1}", stop));
    }
    Some(msg)
}

/// Join per-instrument alerts under a dated header.
pub fn format_daily_report(date: NaiveDate, alerts: &[String]) -> Option<String> {
    if alerts.is_empty() {
        return None;
    }
    let sep = format!("\n{}\n", SEPARATOR);
    Some(format!(
        "Daily war-room report ({})\n{}",
        date.format("%Y-%m-%d"),
        alerts.join(&sep)
    ))
}
