//! Pure aggregation logic: balance computation, category/month joins, and
//! month-key derivation. No IO happens here; everything is deterministic
//! given its inputs, which is what the unit tests lean on.

use chrono::{DateTime, Datelike, Utc};
use serde_json::{Value, json};

use crate::model::{Account, Category, CategoryGroup, MonthSummary, Transaction};

/// Derived (account name, balance) pair. Balance is in major currency units.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub name: String,
    pub balance: f64,
}

/// Computes the balance table from per-account transaction fetch results.
///
/// Closed accounts are excluded. Accounts whose fetch failed (`None`) are
/// excluded rather than reported as zero. The result is sorted by account
/// name using case-folded comparison, with the raw name as tiebreak.
pub fn account_balances(fetched: Vec<(Account, Option<Vec<Transaction>>)>) -> Vec<AccountBalance> {
    let mut balances: Vec<AccountBalance> = fetched
        .into_iter()
        .filter(|(account, _)| !account.closed)
        .filter_map(|(account, transactions)| {
            let transactions = transactions?;
            Some(AccountBalance {
                name: account.name,
                balance: to_major_units(sum_cents(&transactions)),
            })
        })
        .collect();

    balances.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    balances
}

/// Sums transaction amounts in integer minor units.
pub fn sum_cents(transactions: &[Transaction]) -> i64 {
    transactions.iter().map(|t| t.amount).sum()
}

/// Converts integer cents to the human-facing decimal amount.
pub fn to_major_units(cents: i64) -> f64 {
    cents as f64 / 100.0
}

/// Renders account balances as spreadsheet rows.
pub fn balance_rows(balances: &[AccountBalance]) -> Vec<Vec<Value>> {
    balances
        .iter()
        .map(|b| vec![json!(b.name), json!(b.balance)])
        .collect()
}

/// Joins categories with their group names and one month's summary.
///
/// Category listing order is preserved. A category whose group id has no
/// matching group gets an empty group name; a category absent from the
/// month summary gets zeros for budgeted, activity, and balance.
pub fn category_rows(
    categories: &[Category],
    groups: &[CategoryGroup],
    month: &MonthSummary,
) -> Vec<Vec<Value>> {
    categories
        .iter()
        .map(|category| {
            let group_name = groups
                .iter()
                .find(|group| group.id == category.group_id)
                .map(|group| group.name.as_str())
                .unwrap_or("");
            let entry = month.categories.get(&category.id).copied().unwrap_or_default();
            vec![
                json!(group_name),
                json!(category.name),
                json!(entry.budgeted),
                json!(entry.activity),
                json!(entry.balance),
            ]
        })
        .collect()
}

/// Derives the prior and current `YYYY-MM` month keys from the given UTC
/// instant. January rolls the prior key into the previous year.
pub fn month_keys(now: DateTime<Utc>) -> (String, String) {
    let current = format!("{:04}-{:02}", now.year(), now.month());
    let (prior_year, prior_month) = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };
    let prior = format!("{prior_year:04}-{prior_month:02}");
    (prior, current)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use std::collections::HashMap;

    use super::*;
    use crate::model::CategoryMonthEntry;

    fn account(id: &str, name: &str, closed: bool) -> Account {
        Account {
            id: id.into(),
            name: name.into(),
            closed,
        }
    }

    fn txn(account: &str, amount: i64) -> Transaction {
        Transaction {
            id: format!("t-{account}-{amount}"),
            account: account.into(),
            amount,
        }
    }

    #[test]
    fn closed_accounts_are_excluded() {
        let balances = account_balances(vec![
            (account("a1", "Checking", false), Some(vec![txn("a1", 100)])),
            (account("a2", "Closed card", true), Some(vec![txn("a2", 500)])),
            (account("a3", "Savings", false), Some(vec![])),
        ]);

        let names: Vec<&str> = balances.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Checking", "Savings"]);
    }

    #[test]
    fn failed_fetches_are_skipped_not_zeroed() {
        let balances = account_balances(vec![
            (account("a1", "Checking", false), Some(vec![txn("a1", 100)])),
            (account("a2", "Broken", false), None),
            (account("a3", "Savings", false), Some(vec![txn("a3", 200)])),
        ]);

        assert_eq!(balances.len(), 2);
        assert!(balances.iter().all(|b| b.name != "Broken"));
    }

    #[test]
    fn balances_are_sorted_case_insensitively() {
        let balances = account_balances(vec![
            (account("a1", "savings", false), Some(vec![])),
            (account("a2", "Checking", false), Some(vec![])),
            (account("a3", "brokerage", false), Some(vec![])),
        ]);

        let names: Vec<&str> = balances.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["brokerage", "Checking", "savings"]);
        for pair in balances.windows(2) {
            assert!(pair[0].name.to_lowercase() <= pair[1].name.to_lowercase());
        }
    }

    #[test]
    fn cents_convert_to_major_units() {
        let transactions = vec![txn("a1", 250), txn("a1", -100), txn("a1", 75)];
        assert_eq!(sum_cents(&transactions), 225);
        assert_eq!(to_major_units(sum_cents(&transactions)), 2.25);
    }

    #[test]
    fn category_join_produces_exact_row() {
        let categories = vec![Category {
            id: "1".into(),
            name: "Food".into(),
            group_id: "10".into(),
        }];
        let groups = vec![CategoryGroup {
            id: "10".into(),
            name: "Living".into(),
        }];
        let month = MonthSummary {
            categories: HashMap::from([(
                "1".to_string(),
                CategoryMonthEntry {
                    budgeted: 500,
                    activity: -200,
                    balance: 300,
                },
            )]),
        };

        let rows = category_rows(&categories, &groups, &month);
        assert_eq!(rows, vec![vec![
            json!("Living"),
            json!("Food"),
            json!(500),
            json!(-200),
            json!(300),
        ]]);
    }

    #[test]
    fn category_join_defaults_missing_entries() {
        let categories = vec![
            Category {
                id: "1".into(),
                name: "Food".into(),
                group_id: "10".into(),
            },
            Category {
                id: "2".into(),
                name: "Rent".into(),
                group_id: "99".into(),
            },
        ];
        let groups = vec![CategoryGroup {
            id: "10".into(),
            name: "Living".into(),
        }];
        let month = MonthSummary::default();

        let rows = category_rows(&categories, &groups, &month);
        // no month entry → zeros; unknown group → empty name
        assert_eq!(rows[0], vec![json!("Living"), json!("Food"), json!(0), json!(0), json!(0)]);
        assert_eq!(rows[1][0], json!(""));
        // join preserves listing order
        assert_eq!(rows[1][1], json!("Rent"));
    }

    #[test]
    fn month_keys_roll_over_at_january() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let (prior, current) = month_keys(now);
        assert_eq!(current, "2024-01");
        assert_eq!(prior, "2023-12");
    }

    #[test]
    fn month_keys_mid_year() {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 0, 0, 0).unwrap();
        let (prior, current) = month_keys(now);
        assert_eq!(current, "2026-08");
        assert_eq!(prior, "2026-07");
    }
}
