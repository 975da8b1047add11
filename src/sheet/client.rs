//! Google Sheets client over the values API.

use crate::sheet::{BrandRow, BrandSource, ResultRecord, ResultSink};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};
use wreq::Client;

const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Thin adapter over the Sheets v4 values endpoints. Authenticates with a
/// pre-issued OAuth bearer token; reads column A, batch-writes B..E.
pub struct SheetsClient {
    client: Client,
    base_url: String,
    sheet_id: String,
    sheet_name: String,
    token: String,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl SheetsClient {
    /// Creates a client for the production API.
    pub fn new(sheet_id: &str, sheet_name: &str, token: &str) -> Result<Self> {
        Self::with_base_url(sheet_id, sheet_name, token, DEFAULT_API_BASE.to_string())
    }

    /// Creates a client against a custom API base (for testing).
    pub fn with_base_url(
        sheet_id: &str,
        sheet_name: &str,
        token: &str,
        base_url: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build Sheets HTTP client")?;

        Ok(Self {
            client,
            base_url,
            sheet_id: sheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
            token: token.to_string(),
        })
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            self.sheet_id,
            urlencoding::encode(range)
        )
    }

    async fn ensure_success(response: wreq::Response, action: &str) -> Result<wreq::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{} failed with status {}: {}", action, status, body);
        }
        Ok(response)
    }
}

#[async_trait]
impl BrandSource for SheetsClient {
    async fn brands(&self) -> Result<Vec<BrandRow>> {
        let range = format!("{}!A2:A", self.sheet_name);
        debug!("Reading brand list from {}", range);

        let response = self
            .client
            .get(self.values_url(&range))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .context("Failed to reach the spreadsheet API")?;
        let response = Self::ensure_success(response, "Brand list read").await?;

        let body = response.text().await.context("Failed to read brand list response")?;
        let parsed: ValuesResponse =
            serde_json::from_str(&body).context("Failed to parse brand list response")?;

        let mut rows = Vec::new();
        for (i, cells) in parsed.values.iter().enumerate() {
            let name = cells
                .first()
                .and_then(|c| c.as_str())
                .map(str::trim)
                .unwrap_or_default();
            if name.is_empty() {
                continue; // blank row, but its index stays occupied
            }
            rows.push(BrandRow { row_index: i as u32 + 2, name: name.to_string() });
        }

        info!("Read {} brands from sheet '{}'", rows.len(), self.sheet_name);
        Ok(rows)
    }
}

#[async_trait]
impl ResultSink for SheetsClient {
    async fn preflight(&self) -> Result<()> {
        let range = format!("{}!E2", self.sheet_name);
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let response = self
            .client
            .put(format!("{}?valueInputOption=RAW", self.values_url(&range)))
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .body(json!({ "values": [[now]] }).to_string())
            .send()
            .await
            .context("Failed to reach the spreadsheet API")?;
        Self::ensure_success(response, "Sink preflight write").await?;

        info!("Preflight OK: sheet '{}' is writable", self.sheet_name);
        Ok(())
    }

    async fn write_batch(&self, records: &[ResultRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let data: Vec<_> = records
            .iter()
            .map(|r| {
                json!({
                    "range": format!("{}!B{}:E{}", self.sheet_name, r.row_index, r.row_index),
                    "values": [r.row_values()],
                })
            })
            .collect();

        let url = format!(
            "{}/v4/spreadsheets/{}/values:batchUpdate",
            self.base_url, self.sheet_id
        );
        let response = self
            .client
            .post(url)
            .header("Authorization", self.auth_header())
            .header("Content-Type", "application/json")
            .body(json!({ "valueInputOption": "RAW", "data": data }).to_string())
            .send()
            .await
            .context("Failed to reach the spreadsheet API")?;
        Self::ensure_success(response, "Batched result write").await?;

        info!("Flushed {} result rows", records.len());
        Ok(())
    }
}
