use std::collections::HashMap;

use serde::Deserialize;

/// An account as reported by the Actual server. Read-only view; fetched once
/// per run and discarded after balances are computed.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

/// A single transaction. Amounts are signed integers in minor currency
/// units (cents).
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account: String,
    pub amount: i64,
}

/// A budget category.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub group_id: String,
}

/// A category group.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
}

/// Per-category amounts for one calendar month, in minor units.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CategoryMonthEntry {
    #[serde(default)]
    pub budgeted: i64,
    #[serde(default)]
    pub activity: i64,
    #[serde(default)]
    pub balance: i64,
}

/// Snapshot of one month's category amounts, keyed by category id.
/// Categories without an entry default to zeros at join time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthSummary {
    #[serde(default)]
    pub categories: HashMap<String, CategoryMonthEntry>,
}
