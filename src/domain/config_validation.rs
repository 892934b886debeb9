//! Configuration validation.
//!
//! Checks every config field before any data is read, so a bad value fails
//! fast with the offending `[section] key` named.

use crate::domain::error::WarroomError;
use crate::domain::watchlist::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: &str = "Asia/Taipei";
pub const DEFAULT_WATCHLIST: &str = "2330,2408,2454,1519";

/// Scoring keys read as integers; a present-but-unparsable value is rejected.
pub(crate) const SCORING_INT_KEYS: &[&str] = &["strong_buy_score", "bullish_score", "sell_score"];

/// Scoring thresholds that must be strictly positive.
pub(crate) const POSITIVE_SCORING_KEYS: &[&str] = &[
    "revenue_yoy_pct",
    "climactic_drop_pct",
    "climactic_volume_mult",
    "large_outflow_lots",
    "margin_heavy_pct",
    "margin_elevated_pct",
    "foreign_sell_lots",
    "margin_jump_lots",
    "volume_divergence_ratio",
    "adx_no_trend",
    "adx_trending",
    "adx_strong",
    "bias_overheated",
    "bias_hot",
    "stop_atr_mult",
];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), WarroomError> {
    validate_data_path(config)?;
    validate_timezone(config)?;
    validate_watchlist(config)?;
    validate_backtest(config)?;
    validate_scoring(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> WarroomError {
    WarroomError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), WarroomError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(WarroomError::ConfigMissing {
            section: "data".to_string(),
            key: "path".to_string(),
        }),
    }
}

/// The configured exchange timezone, defaulting to Taipei.
pub fn resolve_timezone(config: &dyn ConfigPort) -> Result<Tz, WarroomError> {
    let name = config
        .get_string("session", "timezone")
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    name.trim()
        .parse::<Tz>()
        .map_err(|_| invalid("session", "timezone", format!("unknown timezone '{}'", name)))
}

fn validate_timezone(config: &dyn ConfigPort) -> Result<(), WarroomError> {
    resolve_timezone(config).map(|_| ())
}

fn validate_watchlist(config: &dyn ConfigPort) -> Result<(), WarroomError> {
    if let Some(codes) = config.get_string("watchlist", "codes") {
        parse_codes(&codes)?;
    }
    Ok(())
}

fn validate_backtest(config: &dyn ConfigPort) -> Result<(), WarroomError> {
    if let Some(raw) = config.get_string("backtest", "lookback_bars") {
        match raw.trim().parse::<i64>() {
            Ok(v) if v >= 2 => {}
            Ok(_) => return Err(invalid("backtest", "lookback_bars", "must be at least 2")),
            Err(_) => return Err(invalid("backtest", "lookback_bars", "must be an integer")),
        }
    }
    if let Some(raw) = config.get_string("backtest", "score_threshold") {
        if raw.trim().parse::<i64>().is_err() {
            return Err(invalid("backtest", "score_threshold", "must be an integer"));
        }
    }
    Ok(())
}

fn validate_scoring(config: &dyn ConfigPort) -> Result<(), WarroomError> {
    for key in SCORING_INT_KEYS {
        if let Some(raw) = config.get_string("scoring", key) {
            if raw.trim().parse::<i64>().is_err() {
                return Err(invalid("scoring", key, "must be an integer"));
            }
        }
    }

    for key in POSITIVE_SCORING_KEYS {
        if let Some(raw) = config.get_string("scoring", key) {
            match raw.trim().parse::<f64>() {
                Ok(v) if v > 0.0 && v.is_finite() => {}
                Ok(_) => return Err(invalid("scoring", key, "must be positive")),
                Err(_) => return Err(invalid("scoring", key, "must be a number")),
            }
        }
    }

    let strong = config.get_int("scoring", "strong_buy_score", 6);
    let bullish = config.get_int("scoring", "bullish_score", 2);
    let sell = config.get_int("scoring", "sell_score", -3);
    if strong < bullish {
        return Err(invalid(
            "scoring",
            "strong_buy_score",
            "must be at least bullish_score",
        ));
    }
    if sell >= bullish {
        return Err(invalid("scoring", "sell_score", "must be below bullish_score"));
    }

    let low = config.get_double("scoring", "low_position", 20.0);
    let high = config.get_double("scoring", "high_position", 85.0);
    if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
        return Err(invalid(
            "scoring",
            "low_position",
            "positions must satisfy 0 <= low_position < high_position <= 100",
        ));
    }

    let elevated = config.get_double("scoring", "margin_elevated_pct", 40.0);
    let heavy = config.get_double("scoring", "margin_heavy_pct", 60.0);
    if elevated > heavy {
        return Err(invalid(
            "scoring",
            "margin_elevated_pct",
            "must not exceed margin_heavy_pct",
        ));
    }

    let hot = config.get_double("scoring", "bias_hot", 15.0);
    let overheated = config.get_double("scoring", "bias_overheated", 18.0);
    if hot > overheated {
        return Err(invalid("scoring", "bias_hot", "must not exceed bias_overheated"));
    }
    if config.get_double("scoring", "bias_oversold", -12.0) >= 0.0 {
        return Err(invalid("scoring", "bias_oversold", "must be negative"));
    }
    Ok(())
}
