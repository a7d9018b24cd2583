use std::path::PathBuf;

/// Resolved run configuration.
///
/// Built exactly once at startup from the CLI/environment and passed by
/// reference to every component that needs it; nothing below `main` reads
/// the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Google service-account key file.
    pub credentials_path: PathBuf,
    /// Base URL of the Actual server.
    pub server_url: String,
    /// Password for the Actual server.
    pub server_password: String,
    /// Identifier of the destination spreadsheet.
    pub spreadsheet_id: String,
    /// Range receiving the account balances table.
    pub balances_range: String,
    /// Range receiving the prior month's category table.
    pub prior_month_range: String,
    /// Range receiving the current month's category table.
    pub current_month_range: String,
    /// Identifier of the budget to download.
    pub budget_id: String,
    /// Optional end-to-end encryption password for the budget file.
    pub budget_password: Option<String>,
}
