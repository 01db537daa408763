//! Errors - エラー型と分類
//!
//! - `ConfigError`: 起動時に検出される設定エラー（致命的、draw は始まらない）
//! - `StoreError`: 永続化レイヤーに到達できない（自動リトライはしない）
//! - `CorruptRecord`: 読めない行。ログに出してスキップする（伝播しない）

use std::path::PathBuf;

use thiserror::Error;

use super::Name;

/// Configuration problems detected before any draw is possible.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("roster is empty; at least one name is required")]
    EmptyRoster,

    #[error("roster entry #{index} is blank")]
    BlankName { index: usize },

    #[error("connection target is missing")]
    MissingConnectionTarget,

    #[error("invalid connection target for storage kind {kind}: {target:?} ({reason})")]
    InvalidConnectionTarget {
        kind: String,
        target: String,
        reason: String,
    },

    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The persistence medium could not be reached or written.
///
/// A failed `append` / `clear_all` leaves the persisted records untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable(message.into())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Unavailable(format!("io: {e}"))
    }
}

impl From<csv::Error> for StoreError {
    fn from(e: csv::Error) -> Self {
        StoreError::Unavailable(format!("csv: {e}"))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(format!("database: {e}"))
    }
}

impl From<tempfile::PersistError> for StoreError {
    fn from(e: tempfile::PersistError) -> Self {
        StoreError::Unavailable(format!("persist: {}", e.error))
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        StoreError::Unavailable(format!("blocking task failed: {e}"))
    }
}

/// A stored row that could not be turned into a `DrawRecord`.
///
/// Stores log these at `warn` and skip the row; they never abort a load.
/// When the name is still readable it is kept, so the row keeps blocking
/// that name until the next reset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("corrupt record at {location}: {reason}")]
pub struct CorruptRecord {
    pub location: String,
    pub reason: String,
    pub name: Option<Name>,
}

impl CorruptRecord {
    pub fn new(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            reason: reason.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: Option<Name>) -> Self {
        self.name = name;
        self
    }

    /// Emit the standard warning for a skipped row.
    pub fn log_skipped(&self) {
        tracing::warn!(location = %self.location, reason = %self.reason, "skipping corrupt draw record");
    }
}
