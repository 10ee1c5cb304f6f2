//! Remote sheets store client
//!
//! Talks to the spreadsheet service's values API over HTTP. Writes are
//! retried with bounded exponential backoff on transient failures (network
//! errors, 429s and 5xxs); client errors are surfaced immediately.

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::config::StoreConfig;
use crate::error::{AppError, AppResult};

use super::{Record, TabularStore, FIRST_DATA_ROW};

/// HTTP client for the remote sheets service
#[derive(Clone)]
pub struct SheetsClient {
    api_endpoint: String,
    spreadsheet_id: String,
    api_token: String,
    retry_secs: u64,
    http_client: Client,
}

/// Range payload returned by the values API
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetsClient {
    /// Create a client from store configuration
    pub fn new(config: &StoreConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint: config.api_endpoint.trim_end_matches('/').to_string(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            api_token: config.api_token.clone(),
            retry_secs: config.retry_secs,
            http_client,
        })
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.api_endpoint, self.spreadsheet_id, range
        )
    }

    /// Column number to letters: 1 -> A, 26 -> Z, 27 -> AA
    fn column_letters(mut column: usize) -> String {
        let mut letters = String::new();
        while column > 0 {
            let rem = (column - 1) % 26;
            letters.insert(0, (b'A' + rem as u8) as char);
            column = (column - 1) / 26;
        }
        letters
    }

    /// Issue a request, retrying transient failures with bounded backoff
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<serde_json::Value>,
    ) -> AppResult<reqwest::Response> {
        let policy = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(self.retry_secs)),
            ..ExponentialBackoff::default()
        };

        let response = backoff::future::retry(policy, || async {
            let mut request = self
                .http_client
                .request(method.clone(), url)
                .bearer_auth(&self.api_token);
            if let Some(ref body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(|e| {
                let err = AppError::Store(format!("request failed: {}", e));
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })?;

            let status = response.status();
            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(backoff::Error::transient(AppError::Store(format!(
                    "sheets API returned {}",
                    status
                ))));
            }
            Ok(response)
        })
        .await?;

        Ok(response)
    }
}

#[async_trait]
impl TabularStore for SheetsClient {
    async fn append_row(&self, collection: &str, row: Vec<String>) -> AppResult<()> {
        let url = format!(
            "{}:append?valueInputOption=RAW",
            self.values_url(collection)
        );
        let response = self
            .send(Method::POST, &url, Some(json!({ "values": [row] })))
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "append to '{}' failed ({}): {}",
                collection, status, body
            )));
        }
        Ok(())
    }

    async fn read_all(&self, collection: &str) -> AppResult<Vec<Record>> {
        let url = self.values_url(collection);
        let response = self.send(Method::GET, &url, None).await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "read of '{}' failed ({}): {}",
                collection, status, body
            )));
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| AppError::Store(format!("failed to parse values: {}", e)))?;

        let mut values = range.values.into_iter();
        let header: Vec<String> = values.next().unwrap_or_default();

        let records = values
            .enumerate()
            .map(|(i, row)| {
                let fields = header
                    .iter()
                    .enumerate()
                    .map(|(col, name)| {
                        (name.clone(), row.get(col).cloned().unwrap_or_default())
                    })
                    .collect();
                Record::new(i + FIRST_DATA_ROW, fields)
            })
            .collect();
        Ok(records)
    }

    async fn update_cell(
        &self,
        collection: &str,
        row: usize,
        column: usize,
        value: &str,
    ) -> AppResult<()> {
        let range = format!("{}!{}{}", collection, Self::column_letters(column), row);
        let url = format!("{}?valueInputOption=RAW", self.values_url(&range));
        let response = self
            .send(Method::PUT, &url, Some(json!({ "values": [[value]] })))
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "update of '{}' failed ({}): {}",
                range, status, body
            )));
        }
        Ok(())
    }

    async fn create_collection(&self, collection: &str, header: &[&str]) -> AppResult<()> {
        let url = format!(
            "{}/v4/spreadsheets/{}:batchUpdate",
            self.api_endpoint, self.spreadsheet_id
        );
        let body = json!({
            "requests": [
                { "addSheet": { "properties": { "title": collection } } }
            ]
        });
        let response = self.send(Method::POST, &url, Some(body)).await?;

        let status = response.status();
        if status.is_success() {
            // Freshly created: write the header row
            let range = format!("{}!A1", collection);
            let url = format!("{}?valueInputOption=RAW", self.values_url(&range));
            let header_row: Vec<String> = header.iter().map(|h| h.to_string()).collect();
            let response = self
                .send(Method::PUT, &url, Some(json!({ "values": [header_row] })))
                .await?;
            if !response.status().is_success() {
                let status = response.status();
                return Err(AppError::Store(format!(
                    "header write for '{}' failed ({})",
                    collection, status
                )));
            }
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if body.contains("already exists") {
            // Idempotent create: the collection is already there
            return Ok(());
        }
        Err(AppError::Store(format!(
            "create of '{}' failed ({}): {}",
            collection, status, body
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(SheetsClient::column_letters(1), "A");
        assert_eq!(SheetsClient::column_letters(2), "B");
        assert_eq!(SheetsClient::column_letters(26), "Z");
        assert_eq!(SheetsClient::column_letters(27), "AA");
        assert_eq!(SheetsClient::column_letters(52), "AZ");
        assert_eq!(SheetsClient::column_letters(703), "AAA");
    }
}
