//! Watchlist: the ordered list of instrument codes to analyse.
//!
//! Parses code lists from configuration or the command line and screens
//! out codes that have no usable history.

use crate::domain::error::WarroomError;
use crate::ports::data_port::DataPort;
use std::collections::HashSet;

/// Fewer bars than this and most indicators never leave warmup.
pub const MIN_OHLCV_BARS: usize = 30;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),

    #[error("no watchlist code has usable history")]
    AllCodesFailed,
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, WatchlistError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(WatchlistError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Screened {
    pub codes: Vec<String>,
    pub skipped: Vec<SkippedCode>,
}

/// Keep codes with at least `MIN_OHLCV_BARS` bars of history.
pub fn screen_codes(data_port: &dyn DataPort, codes: Vec<String>) -> Result<Screened, WarroomError> {
    let mut valid = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        let reason = match data_port.get_data_range(&code) {
            Ok(Some((_, _, bars))) if bars >= MIN_OHLCV_BARS => {
                tracing::info!(%code, bars, "watchlist code ok");
                valid.push(code);
                continue;
            }
            Ok(Some((_, _, bars))) => SkipReason::InsufficientBars { bars },
            Ok(None) => SkipReason::NoData,
            Err(e) => {
                tracing::warn!(%code, error = %e, "failed to read history");
                SkipReason::NoData
            }
        };
        tracing::warn!(%code, ?reason, "skipping watchlist code");
        skipped.push(SkippedCode { code, reason });
    }

    if valid.is_empty() {
        return Err(WatchlistError::AllCodesFailed.into());
    }
    Ok(Screened {
        codes: valid,
        skipped,
    })
}
