//! Run orchestration: one sequential pass from the Actual server into the
//! spreadsheet. The flow is download → sync → balances → month tables →
//! authorize → write, with the session released on every exit path once it
//! exists.

use std::thread;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::actual::ActualClient;
use crate::aggregate;
use crate::config::Config;
use crate::error::Result;
use crate::model::{Account, Category, CategoryGroup, Transaction};
use crate::sheets::SheetsClient;

/// The three row sets destined for the spreadsheet.
struct SheetPayload {
    balances: Vec<Vec<Value>>,
    prior_month: Vec<Vec<Value>>,
    current_month: Vec<Vec<Value>>,
}

/// Runs one full sync against the configured servers.
///
/// The Actual session is the only releasable resource; it is shut down
/// exactly once whether the body succeeds or fails. A logout failure is
/// logged, never escalated.
#[instrument(level = "info", skip_all, fields(server = %config.server_url))]
pub fn run(config: &Config) -> Result<()> {
    info!("starting Actual session");
    let session = ActualClient::connect(&config.server_url, &config.server_password)?;

    let result = collect(config, &session).and_then(|payload| {
        info!("authorizing Sheets access");
        let sheets = SheetsClient::authorize(&config.credentials_path)?;
        publish(config, &sheets, &payload)
    });

    match session.shutdown() {
        Ok(()) => debug!("Actual session released"),
        Err(error) => warn!(%error, "failed to release Actual session"),
    }
    result
}

/// Same flow as [`run`] but with both clients supplied by the caller, which
/// also owns the session release. Used by the integration tests to drive
/// the orchestration against mock servers.
pub fn run_with_clients(
    config: &Config,
    session: &ActualClient,
    sheets: &SheetsClient,
) -> Result<()> {
    let payload = collect(config, session)?;
    publish(config, sheets, &payload)
}

/// Steps 3–7: download and sync the budget, then aggregate everything the
/// spreadsheet needs.
fn collect(config: &Config, session: &ActualClient) -> Result<SheetPayload> {
    session.download_budget(&config.budget_id, config.budget_password.as_deref())?;
    info!(budget = %config.budget_id, "budget downloaded");

    session.sync_budget()?;
    info!("budget synchronized");

    let accounts = session.accounts()?;
    let open: Vec<Account> = accounts.into_iter().filter(|a| !a.closed).collect();
    info!(accounts = open.len(), "fetching transactions for open accounts");
    let fetched = fetch_transactions(session, open);
    let balances = aggregate::account_balances(fetched);
    info!(rows = balances.len(), "computed account balances");

    let (prior_key, current_key) = aggregate::month_keys(Utc::now());
    let categories = session.categories()?;
    let groups = session.category_groups()?;
    debug!(
        categories = categories.len(),
        groups = groups.len(),
        "fetched category definitions"
    );

    Ok(SheetPayload {
        balances: aggregate::balance_rows(&balances),
        prior_month: month_rows(session, &categories, &groups, &prior_key),
        current_month: month_rows(session, &categories, &groups, &current_key),
    })
}

/// Per-account transaction fan-out. Completion order is irrelevant; results
/// are joined back before the order-sensitive sort. A failed fetch yields
/// `None` for that account and never aborts its siblings.
fn fetch_transactions(
    session: &ActualClient,
    accounts: Vec<Account>,
) -> Vec<(Account, Option<Vec<Transaction>>)> {
    thread::scope(|scope| {
        let handles: Vec<_> = accounts
            .into_iter()
            .map(|account| {
                scope.spawn(move || match session.transactions(&account.id) {
                    Ok(transactions) => (account, Some(transactions)),
                    Err(error) => {
                        warn!(account = %account.name, %error, "no valid transactions, skipping account");
                        (account, None)
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("transaction fetch thread panicked"))
            .collect()
    })
}

/// Fetches one month's summary and joins it against the category listing.
/// A fetch failure leaves that month's table empty rather than aborting.
fn month_rows(
    session: &ActualClient,
    categories: &[Category],
    groups: &[CategoryGroup],
    month_key: &str,
) -> Vec<Vec<Value>> {
    match session.month(month_key) {
        Ok(month) => aggregate::category_rows(categories, groups, &month),
        Err(error) => {
            warn!(month = month_key, %error, "failed to fetch month data, writing empty rows");
            Vec::new()
        }
    }
}

/// Step 9: write the three ranges. Each write is independent; a rejected
/// update is logged and the remaining ranges are still attempted. Only the
/// sheet-existence check can abort here.
#[instrument(level = "debug", skip_all)]
fn publish(config: &Config, sheets: &SheetsClient, payload: &SheetPayload) -> Result<()> {
    let targets = [
        (&config.balances_range, &payload.balances),
        (&config.prior_month_range, &payload.prior_month),
        (&config.current_month_range, &payload.current_month),
    ];

    for (range, rows) in targets {
        if let Some(title) = sheet_title(range) {
            sheets.ensure_sheet_exists(&config.spreadsheet_id, title)?;
        }
        match sheets.update_range(&config.spreadsheet_id, range, rows) {
            Ok(()) => info!(%range, rows = rows.len(), "range updated"),
            Err(error) => warn!(%error, "range update failed, continuing"),
        }
    }

    info!("data sync completed");
    Ok(())
}

/// Extracts the sheet title from an A1-notation range, unquoting titles
/// written as `'My Sheet'!A1:B2`.
fn sheet_title(range: &str) -> Option<&str> {
    let (title, _) = range.split_once('!')?;
    let title = title
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(title);
    if title.is_empty() { None } else { Some(title) }
}
