//! Domain error types.

use crate::domain::watchlist::WatchlistError;

/// Top-level error type for warroom.
#[derive(Debug, thiserror::Error)]
pub enum WarroomError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no price history for {code}")]
    NoData { code: String },

    #[error("cannot score an empty bar series")]
    EmptySeries,

    #[error(transparent)]
    Watchlist(#[from] WatchlistError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WarroomError {
    pub(crate) fn data(reason: impl Into<String>) -> Self {
        WarroomError::Data {
            reason: reason.into(),
        }
    }
}

impl From<&WarroomError> for std::process::ExitCode {
    fn from(err: &WarroomError) -> Self {
        let code: u8 = match err {
            WarroomError::Io(_) => 1,
            WarroomError::ConfigParse { .. }
            | WarroomError::ConfigMissing { .. }
            | WarroomError::ConfigInvalid { .. } => 2,
            WarroomError::Data { .. } | WarroomError::NoData { .. } => 3,
            WarroomError::Watchlist(_) => 4,
            WarroomError::EmptySeries => 5,
        };
        std::process::ExitCode::from(code)
    }
}
