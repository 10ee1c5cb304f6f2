//! Invoice document renderer client
//!
//! Sends a computed invoice to the rendering service and gets back a
//! paginated PDF. The invoice row is already persisted before rendering is
//! attempted, so a renderer failure degrades to a text-only reply.

use std::time::Duration;

use reqwest::Client;
use shared::InvoiceRecord;

use crate::config::RendererConfig;
use crate::error::{AppError, AppResult};

/// Client for the document rendering service
#[derive(Clone)]
pub struct RendererClient {
    api_endpoint: String,
    http_client: Client,
}

impl RendererClient {
    /// Create a renderer client; `None` when no endpoint is configured
    pub fn from_config(config: &RendererConfig) -> AppResult<Option<Self>> {
        if config.api_endpoint.trim().is_empty() {
            return Ok(None);
        }
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Some(Self {
            api_endpoint: config.api_endpoint.clone(),
            http_client,
        }))
    }

    /// Render an invoice to PDF bytes
    pub async fn render_invoice(&self, invoice: &InvoiceRecord) -> AppResult<Vec<u8>> {
        let response = self
            .http_client
            .post(&self.api_endpoint)
            .json(invoice)
            .send()
            .await
            .map_err(|e| AppError::Renderer(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Renderer(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Renderer(format!("read failed: {}", e)))?;
        Ok(bytes.to_vec())
    }
}
