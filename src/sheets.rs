//! Google Sheets client — appends rows via the values:append endpoint.
//!
//! Authentication is out of scope for the relay: a ready bearer access
//! token is taken from configuration and sent as-is. Appends are
//! fire-and-forget from the dispatcher's perspective; the API itself is
//! at-least-once.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::dispatch::SheetAppender;
use crate::error::SheetError;

/// Default worksheet tab for appends.
const DEFAULT_RANGE: &str = "Sheet1";

/// REST client for Google Sheets row appends.
pub struct SheetsClient {
    access_token: SecretString,
    range: String,
    client: reqwest::Client,
}

impl SheetsClient {
    pub fn new(access_token: SecretString) -> Self {
        Self {
            access_token,
            range: DEFAULT_RANGE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the target worksheet range (defaults to `Sheet1`).
    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = range.into();
        self
    }

    fn append_url(&self, sheet_id: &str) -> String {
        format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{sheet_id}/values/{}:append?valueInputOption=USER_ENTERED",
            self.range
        )
    }
}

#[async_trait]
impl SheetAppender for SheetsClient {
    async fn append_row(&self, sheet_id: &str, row: Vec<String>) -> Result<(), SheetError> {
        let body = serde_json::json!({ "values": [row] });

        let resp = self
            .client
            .post(self.append_url(sheet_id))
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| SheetError::AppendFailed {
                sheet_id: sheet_id.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(SheetError::AppendFailed {
                sheet_id: sheet_id.to_string(),
                reason: format!("append returned {status}: {err}"),
            });
        }

        tracing::debug!(sheet_id, "Sheet row appended");
        Ok(())
    }
}

/// Stand-in appender used when no Sheets access token is configured.
/// Every append fails with a clear reason; the dispatcher logs and
/// moves on, so forwarding keeps working without a sheets backend.
pub struct DisabledSheets;

#[async_trait]
impl SheetAppender for DisabledSheets {
    async fn append_row(&self, _sheet_id: &str, _row: Vec<String>) -> Result<(), SheetError> {
        Err(SheetError::NotConfigured(
            "SHEETS_ACCESS_TOKEN not set".into(),
        ))
    }
}
