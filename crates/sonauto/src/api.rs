//! REST API client for the Sonauto HTTP endpoints.
//!
//! Wraps generation submission, status polling, and result download
//! using [`reqwest`]. The API key is passed per call so the client itself
//! holds no credentials.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;

use crate::messages::{GenerationPayload, GenerationStatusResponse, SubmitResponse};

/// Production Sonauto endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.sonauto.ai";

/// Per-request timeout applied to every HTTP call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the Sonauto API.
#[derive(Debug, Clone)]
pub struct SonautoApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the Sonauto REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum SonautoApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, body decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Sonauto returned a non-2xx status code.
    #[error("Sonauto API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl SonautoApiError {
    /// Whether retrying the same idempotent request may succeed.
    ///
    /// Network failures, rate limiting and server errors are transient;
    /// any other HTTP status is a definitive rejection.
    pub fn is_transient(&self) -> bool {
        match self {
            SonautoApiError::Request(_) => true,
            SonautoApiError::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
        }
    }
}

impl SonautoApi {
    /// Create a client for `base_url` (e.g. `https://api.sonauto.ai`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, SonautoApiError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a generation job.
    ///
    /// Sends `POST /v1/generations` and returns the remote `task_id`.
    pub async fn submit_generation(
        &self,
        api_key: &str,
        payload: &GenerationPayload,
    ) -> Result<SubmitResponse, SonautoApiError> {
        let response = self
            .client
            .post(format!("{}/v1/generations", self.base_url))
            .header(AUTHORIZATION, bearer(api_key))
            .json(payload)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current status of a generation task.
    ///
    /// Sends `GET /v1/generations/{task_id}`.
    pub async fn get_generation(
        &self,
        api_key: &str,
        task_id: &str,
    ) -> Result<GenerationStatusResponse, SonautoApiError> {
        let response = self
            .client
            .get(format!("{}/v1/generations/{}", self.base_url, task_id))
            .header(AUTHORIZATION, bearer(api_key))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download a result file. The URL is used verbatim, without auth.
    pub async fn download_media(&self, url: &str) -> Result<Vec<u8>, SonautoApiError> {
        let response = self.client.get(url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or an
    /// [`SonautoApiError::Api`] with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, SonautoApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SonautoApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SonautoApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn bearer(api_key: &str) -> String {
    format!("Bearer {api_key}")
}
