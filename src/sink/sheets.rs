use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use super::auth::{truncate, ServiceAccount, SHEETS_SCOPE};
use super::{AppendReceipt, RowSink, SinkError};
use crate::config::{SheetsConfig, ValueInput};
use crate::submission::normalize::Row;

/// Appends rows to a Google Sheets range through the v4 `values.append` call.
pub struct SheetsSink {
    client: reqwest::Client,
    account: ServiceAccount,
    append_url: Url,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: AppendUpdates,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    updated_range: Option<String>,
    #[serde(default)]
    updated_rows: u64,
}

impl SheetsSink {
    pub fn new(config: &SheetsConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SinkError::Request(format!("Failed to build HTTP client: {e}")))?;

        let account = ServiceAccount::new(&config.client_email, &config.private_key, &config.token_uri)?;
        let append_url = append_url(&config.api_base, &config.sheet_id, &config.range, config.value_input)?;

        Ok(Self {
            client,
            account,
            append_url,
        })
    }

    pub fn append_url(&self) -> &Url {
        &self.append_url
    }
}

/// `{base}/v4/spreadsheets/{id}/values/{range}:append?valueInputOption={USER_ENTERED|RAW}`
fn append_url(api_base: &str, sheet_id: &str, range: &str, value_input: ValueInput) -> Result<Url, SinkError> {
    let mut url = Url::parse(api_base)
        .map_err(|e| SinkError::Request(format!("Invalid sheets API base '{api_base}': {e}")))?;

    let last = format!("{range}:append");
    url.path_segments_mut()
        .map_err(|_| SinkError::Request(format!("Sheets API base cannot carry a path: {api_base}")))?
        .pop_if_empty()
        .extend(["v4", "spreadsheets", sheet_id, "values", last.as_str()]);

    url.query_pairs_mut()
        .append_pair("valueInputOption", value_input.as_str());

    Ok(url)
}

#[async_trait]
impl RowSink for SheetsSink {
    fn name(&self) -> &str {
        "google-sheets"
    }

    async fn append_row(&self, row: &Row) -> Result<AppendReceipt, SinkError> {
        let token = self.account.access_token(&self.client, SHEETS_SCOPE).await?;

        let resp = self
            .client
            .post(self.append_url.clone())
            .bearer_auth(token)
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| SinkError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body: truncate(&body, 1024),
            });
        }

        // The append already happened; an unreadable body only loses the receipt.
        let parsed: AppendResponse = resp.json().await.unwrap_or_else(|e| {
            tracing::warn!("Unreadable append response from {}: {e}", self.account.client_email());
            AppendResponse::default()
        });

        Ok(AppendReceipt {
            updated_range: parsed.updates.updated_range,
            updated_rows: parsed.updates.updated_rows,
        })
    }
}
