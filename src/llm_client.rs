use crate::config::Config;
use crate::gemini::{GeminiRequest, GeminiResponse};
use crate::request_id::{REQUEST_ID_HEADER, RequestId};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::HeaderValue;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// The single vendor operation the proxy needs.
///
/// Every failure (transport, non-success status, undecodable body) comes back
/// as an `Err`; callers do not distinguish between them.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(&self, request: &GeminiRequest, request_id: &RequestId) -> Result<GeminiResponse>;
}

#[derive(Debug)]
pub struct GeminiClient {
    http_client: Arc<reqwest::Client>,
    config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

impl GeminiClient {
    pub fn new(http_client: Arc<reqwest::Client>, config: Arc<Config>) -> Self {
        Self { http_client, config }
    }

    /// Builds the pooled HTTP client honouring the configured proxy and timeout.
    pub fn build_http_client(config: &Config) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy).with_context(|| format!("invalid proxy url: {}", proxy))?;
            builder = builder.proxy(proxy);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().context("failed to build HTTP client")
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

fn describe_error_body(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<GoogleErrorEnvelope>(body) {
        Ok(GoogleErrorEnvelope { error }) => format!(
            "{} {}. {}",
            error.code.unwrap_or(status.as_u16()),
            error.status.unwrap_or_else(|| status.canonical_reason().unwrap_or("UNKNOWN").to_string()),
            error.message.unwrap_or_default()
        ),
        Err(_) => format!("{} {}", status, body.trim()),
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate_content(&self, request: &GeminiRequest, request_id: &RequestId) -> Result<GeminiResponse> {
        let target_url = self.config.generate_content_url();

        let mut target_request = self
            .http_client
            .post(&target_url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.config.api_key);

        if let Ok(val) = HeaderValue::from_str(&request_id.0) {
            target_request = target_request.header(REQUEST_ID_HEADER, val);
        }

        info!("Forwarding request to: {}", target_url);
        let response = target_request.json(request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(anyhow!(describe_error_body(status, &body)));
        }

        debug!("raw response: {}", body);
        let parsed: GeminiResponse = serde_json::from_str(&body).context("malformed vendor response")?;
        Ok(parsed)
    }
}
