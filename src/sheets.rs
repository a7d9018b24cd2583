//! Google Sheets HTTP client.
//!
//! Service-account authorization (RS256 JWT bearer grant) plus the three
//! Sheets v4 calls the sync needs: spreadsheet metadata, addSheet, and
//! values.update with `USER_ENTERED` input semantics.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Result, SyncError};

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: u64 = 3600;
const TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("actual-sheets/", env!("CARGO_PKG_VERSION"));

/// Subset of a Google service-account key file used for authorization.
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

/// Claim set for the service-account assertion.
#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

/// Authorized Sheets client. The bearer token is obtained once and reused
/// across all range updates within one run; there is nothing to release.
#[derive(Debug)]
pub struct SheetsClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

impl SheetsClient {
    /// Builds an authorized client from a service-account key file.
    ///
    /// Reads the key, signs a spreadsheet-scoped RS256 assertion, and
    /// exchanges it at the key's token endpoint. Any failure is fatal.
    pub fn authorize(credentials_path: &Path) -> Result<Self> {
        if !credentials_path.exists() {
            return Err(SyncError::MissingCredentials(credentials_path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(credentials_path)
            .map_err(|e| SyncError::SheetsAuth(format!("failed to read key file: {e}")))?;
        let key: ServiceAccountKey = serde_json::from_str(&contents)
            .map_err(|e| SyncError::SheetsAuth(format!("invalid key file: {e}")))?;

        let http = build_http().map_err(|e| SyncError::SheetsAuth(e.to_string()))?;
        let token = exchange_assertion(&http, &key)?;

        Ok(Self {
            http,
            api_base: SHEETS_API_BASE.to_string(),
            token,
        })
    }

    /// Builds a client with an explicit token and API base, bypassing the
    /// token exchange. Used by tests against a mock server.
    pub fn with_token(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            http: build_http().expect("failed to build HTTP client"),
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// Creates the sheet with the given title if the spreadsheet does not
    /// already have one. Safe to call repeatedly; a second call with the
    /// same title performs no creation request.
    pub fn ensure_sheet_exists(&self, spreadsheet_id: &str, title: &str) -> Result<()> {
        let url = format!(
            "{}/v4/spreadsheets/{}?fields=sheets.properties.title",
            self.api_base, spreadsheet_id
        );
        let metadata = self
            .request(self.http.get(&url))
            .map_err(|reason| SyncError::SheetEnsure {
                title: title.to_string(),
                reason,
            })?;

        let exists = metadata["sheets"]
            .as_array()
            .map(|sheets| {
                sheets
                    .iter()
                    .any(|sheet| sheet["properties"]["title"].as_str() == Some(title))
            })
            .unwrap_or(false);
        if exists {
            return Ok(());
        }

        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.api_base, spreadsheet_id
        );
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        self.request(self.http.post(&url).json(&body))
            .map_err(|reason| SyncError::SheetEnsure {
                title: title.to_string(),
                reason,
            })?;
        Ok(())
    }

    /// Overwrites the target range with the given rows.
    ///
    /// Values are written with `USER_ENTERED` input semantics so numbers and
    /// dates are typed by the spreadsheet rather than stored as raw strings.
    pub fn update_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<Value>],
    ) -> Result<()> {
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}?valueInputOption=USER_ENTERED",
            self.api_base, spreadsheet_id, range
        );
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": rows,
        });
        self.request(self.http.put(&url).json(&body))
            .map_err(|reason| SyncError::RangeUpdate {
                range: range.to_string(),
                reason,
            })?;
        Ok(())
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Sends an authenticated request; errors come back as a bare reason
    /// string so each caller can attach its own context.
    fn request(
        &self,
        builder: reqwest::blocking::RequestBuilder,
    ) -> std::result::Result<Value, String> {
        let response = builder
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!("HTTP {}: {}", status.as_u16(), body));
        }
        response.json().map_err(|e| e.to_string())
    }
}

fn build_http() -> std::result::Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
}

/// Signs the service-account assertion and trades it for a bearer token.
fn exchange_assertion(http: &reqwest::blocking::Client, key: &ServiceAccountKey) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let claims = Claims {
        iss: &key.client_email,
        scope: SPREADSHEETS_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + TOKEN_LIFETIME_SECS,
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SyncError::SheetsAuth(format!("invalid private key: {e}")))?;
    let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| SyncError::SheetsAuth(format!("failed to sign assertion: {e}")))?;

    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
        .send()
        .map_err(|e| SyncError::SheetsAuth(e.to_string()))?;
    if !response.status().is_success() {
        return Err(SyncError::SheetsAuth(format!(
            "token endpoint returned HTTP {}",
            response.status().as_u16()
        )));
    }

    let body: Value = response
        .json()
        .map_err(|e| SyncError::SheetsAuth(e.to_string()))?;
    body["access_token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SyncError::SheetsAuth("token response missing access_token".into()))
}
