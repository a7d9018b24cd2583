use std::path::PathBuf;

use actual_sheets::{Config, Result, SyncError, sync};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    if let Err(error) = init_logging() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }

    let config = cli.into_config();
    if let Err(error) = sync::run(&config) {
        if error.is_fatal() {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
        // Recoverable failures were already handled where they occurred;
        // whatever propagated this far is logged and the run still counts
        // as completed.
        tracing::error!(%error, "sync finished with errors");
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| SyncError::Logging(e.to_string()))
}

/// Sync Actual Budget balances and category budgets into Google Sheets.
///
/// Every setting is resolvable from the environment, so a bare invocation
/// inside a configured shell or container does a full sync. Missing values
/// are reported by name before any network activity happens.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the Google service-account key file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: PathBuf,

    /// Base URL of the Actual server.
    #[arg(long, env = "ACTUAL_SERVER_URL")]
    server_url: String,

    /// Password for the Actual server.
    #[arg(long, env = "ACTUAL_SERVER_PASSWORD", hide_env_values = true)]
    server_password: String,

    /// Identifier of the destination spreadsheet.
    #[arg(long, env = "SPREADSHEET_ID")]
    spreadsheet_id: String,

    /// Range receiving the account balances table.
    #[arg(long, env = "ACCOUNTS_BALANCES_RANGE")]
    balances_range: String,

    /// Range receiving the prior month's category table.
    #[arg(long, env = "PRIOR_MONTH_RANGE")]
    prior_month_range: String,

    /// Range receiving the current month's category table.
    #[arg(long, env = "CURRENT_MONTH_RANGE")]
    current_month_range: String,

    /// Identifier of the budget to download.
    #[arg(long, env = "ACTUAL_BUDGET_ID")]
    budget_id: String,

    /// End-to-end encryption password for the budget file, if set.
    #[arg(long, env = "ACTUAL_BUDGET_PASSWORD", hide_env_values = true)]
    budget_password: Option<String>,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            credentials_path: self.credentials,
            server_url: self.server_url,
            server_password: self.server_password,
            spreadsheet_id: self.spreadsheet_id,
            balances_range: self.balances_range,
            prior_month_range: self.prior_month_range,
            current_month_range: self.current_month_range,
            budget_id: self.budget_id,
            budget_password: self.budget_password,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn all_settings_are_required_except_budget_password() {
        let required: Vec<String> = Cli::command()
            .get_arguments()
            .filter(|arg| arg.is_required_set())
            .map(|arg| arg.get_id().to_string())
            .collect();

        for name in [
            "credentials",
            "server_url",
            "server_password",
            "spreadsheet_id",
            "balances_range",
            "prior_month_range",
            "current_month_range",
            "budget_id",
        ] {
            assert!(required.contains(&name.to_string()), "{name} must be required");
        }
        assert!(!required.contains(&"budget_password".to_string()));
    }
}
