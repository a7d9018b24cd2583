//! Actual server HTTP client.
//!
//! Blocking reqwest client (no async runtime required). Covers the budget
//! session lifecycle: login → download → sync → listings → logout.

use std::time::Duration;

use serde_json::{Value, json};

use crate::error::{Result, SyncError};
use crate::model::{Account, Category, CategoryGroup, MonthSummary, Transaction};

const TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("actual-sheets/", env!("CARGO_PKG_VERSION"));

/// Session token header expected by the Actual server.
const TOKEN_HEADER: &str = "X-ACTUAL-TOKEN";

/// Authenticated session with an Actual server.
///
/// Holds the single session token for the run. The orchestrator owns exactly
/// one of these and consumes it through [`ActualClient::shutdown`] on every
/// exit path once the session exists.
#[derive(Debug)]
pub struct ActualClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
}

impl ActualClient {
    /// Logs in to the server and returns an authenticated client.
    ///
    /// Any failure here (unreachable server, bad password, malformed
    /// response) is fatal for the run.
    pub fn connect(base_url: &str, password: &str) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SyncError::Session(e.to_string()))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let url = format!("{base_url}/account/login");
        let response = http
            .post(&url)
            .json(&json!({ "loginMethod": "password", "password": password }))
            .send()
            .map_err(|e| SyncError::Session(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Session(format!(
                "login returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: Value = response
            .json()
            .map_err(|e| SyncError::Session(e.to_string()))?;
        let token = body["data"]["token"]
            .as_str()
            .ok_or_else(|| SyncError::Session("login response missing token".into()))?
            .to_string();

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// Downloads the named remote budget into the server-side working copy.
    ///
    /// An empty or invalid `data` object in the response is fatal: nothing
    /// downstream is meaningful without a budget.
    pub fn download_budget(&self, budget_id: &str, password: Option<&str>) -> Result<()> {
        let mut body = json!({ "id": budget_id });
        if let Some(password) = password {
            body["password"] = Value::String(password.to_string());
        }

        let response = self
            .post("/budget/download", &body)
            .map_err(|e| SyncError::BudgetDownload {
                budget_id: budget_id.to_string(),
                reason: e.to_string(),
            })?;

        match response["data"].as_object() {
            Some(data) if !data.is_empty() => Ok(()),
            _ => Err(SyncError::BudgetDownload {
                budget_id: budget_id.to_string(),
                reason: "empty or invalid budget data received".into(),
            }),
        }
    }

    /// Pulls the latest changes into the working copy.
    pub fn sync_budget(&self) -> Result<()> {
        self.post("/budget/sync", &json!({}))?;
        Ok(())
    }

    /// Lists all accounts in the budget, closed ones included.
    pub fn accounts(&self) -> Result<Vec<Account>> {
        let body = self.get("/accounts")?;
        let data = data_field(body, "/accounts")?;
        Ok(serde_json::from_value(data)?)
    }

    /// Lists all transactions for one account.
    ///
    /// A response whose `data` is missing or not an array yields an error;
    /// the orchestrator logs it and excludes the account from balances.
    pub fn transactions(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let endpoint = format!("/accounts/{account_id}/transactions");
        let body = self.get(&endpoint)?;
        if !body["data"].is_array() {
            return Err(SyncError::Api {
                endpoint,
                reason: "data is not an array".into(),
            });
        }
        Ok(serde_json::from_value(body["data"].clone())?)
    }

    /// Lists all categories, in the server's listing order.
    pub fn categories(&self) -> Result<Vec<Category>> {
        let body = self.get("/categories")?;
        let data = data_field(body, "/categories")?;
        Ok(serde_json::from_value(data)?)
    }

    /// Lists all category groups.
    pub fn category_groups(&self) -> Result<Vec<CategoryGroup>> {
        let body = self.get("/category-groups")?;
        let data = data_field(body, "/category-groups")?;
        Ok(serde_json::from_value(data)?)
    }

    /// Fetches the per-category summary for one `YYYY-MM` month key.
    pub fn month(&self, month_key: &str) -> Result<MonthSummary> {
        let endpoint = format!("/months/{month_key}");
        let body = self.get(&endpoint)?;
        let data = data_field(body, &endpoint)?;
        Ok(serde_json::from_value(data)?)
    }

    /// Releases the session. Consumes the client so it can only run once.
    pub fn shutdown(self) -> Result<()> {
        self.post("/account/logout", &json!({}))?;
        Ok(())
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn get(&self, endpoint: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .header(TOKEN_HEADER, &self.token)
            .send()?;
        read_json(response, endpoint)
    }

    fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .header(TOKEN_HEADER, &self.token)
            .json(body)
            .send()?;
        read_json(response, endpoint)
    }
}

fn read_json(response: reqwest::blocking::Response, endpoint: &str) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(SyncError::Api {
            endpoint: endpoint.to_string(),
            reason: format!("HTTP {}: {}", status.as_u16(), body),
        });
    }
    response.json().map_err(SyncError::from)
}

fn data_field(mut body: Value, endpoint: &str) -> Result<Value> {
    match body.get_mut("data") {
        Some(data) if !data.is_null() => Ok(data.take()),
        _ => Err(SyncError::Api {
            endpoint: endpoint.to_string(),
            reason: "response missing 'data'".into(),
        }),
    }
}
