//! Error types for the engine crate.
//!
//! Queue mutations never error: a refused add/remove/start is a no-op that
//! the caller observes through unchanged state. Everything here is either a
//! load-time validation failure or an I/O failure reported upward.

use skyqueue_logic::tiers::TierParseError;

/// Catalog data that cannot be turned into observations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("observation {id}: {source}")]
    UnknownTier {
        id: u32,
        #[source]
        source: TierParseError,
    },
    #[error("observation {id}: unknown target type '{kind}'")]
    UnknownKind { id: u32, kind: String },
    #[error("observation {id}: duration must be positive")]
    InvalidDuration { id: u32 },
    #[error("duplicate observation id {0}")]
    DuplicateId(u32),
    #[error("catalog is empty")]
    Empty,
}

/// Simulation configuration that cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors that can occur during save/load.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("week is not complete; nothing to export")]
    NoSummary,
}

/// Failures talking to the leaderboard service.
#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("timeout")]
    Timeout,
    #[error("parse error: {0}")]
    Parse(String),
    #[error("server error (status {status}): {message}")]
    ServerError { status: u16, message: String },
    /// The service answered with `{ "error": ... }`.
    #[error("submission rejected: {0}")]
    Rejected(String),
    #[error("week is not complete; no score to submit")]
    WeekNotComplete,
}

impl From<reqwest::Error> for LeaderboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LeaderboardError::Timeout
        } else if err.is_connect() {
            LeaderboardError::Connection(err.to_string())
        } else if err.is_decode() {
            LeaderboardError::Parse(err.to_string())
        } else {
            LeaderboardError::Http(err.to_string())
        }
    }
}
