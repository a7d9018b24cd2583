use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type covering the different failure cases that can occur while the
/// tool talks to the Actual server, aggregates data, or writes to Google
/// Sheets.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when the Actual session login fails.
    #[error("failed to start Actual session: {0}")]
    Session(String),

    /// Raised when the budget download returns empty or invalid data.
    #[error("failed to download budget '{budget_id}': {reason}")]
    BudgetDownload { budget_id: String, reason: String },

    /// Raised when an Actual API response does not have the expected shape.
    #[error("unexpected Actual response for {endpoint}: {reason}")]
    Api { endpoint: String, reason: String },

    /// Raised when Google service-account authorization cannot be built.
    #[error("failed to authorize Sheets access: {0}")]
    SheetsAuth(String),

    /// Raised when the sheet-existence check or sheet creation fails.
    #[error("failed to ensure sheet '{title}' exists: {reason}")]
    SheetEnsure { title: String, reason: String },

    /// Raised when a range update is rejected by the Sheets API.
    #[error("failed to update range '{range}': {reason}")]
    RangeUpdate { range: String, reason: String },

    /// Raised when the service-account key file does not exist.
    #[error("credentials file not found: {0}")]
    MissingCredentials(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl SyncError {
    /// Whether the error aborts the run with a non-zero exit status.
    ///
    /// Session login, budget download, Sheets authorization, and sheet
    /// existence/creation failures are fatal. Everything else is logged and
    /// the run still exits zero.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::Session(_)
                | SyncError::BudgetDownload { .. }
                | SyncError::SheetsAuth(_)
                | SyncError::SheetEnsure { .. }
                | SyncError::MissingCredentials(_)
                | SyncError::Logging(_)
        )
    }
}
