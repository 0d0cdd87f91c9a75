//! Client for the generative blend endpoint.
//!
//! This adapter speaks the Gradio request/response convention
//! (`POST {"fn_index": 0, "data": [...]}` against `/run/predict`) and
//! exposes the two operations the editor needs: instruction-driven
//! image edits and background removal.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;
use url::Url;

/// Instruction applied when the caller does not supply one.
pub const DEFAULT_INSTRUCTION: &str = "Blend the added subjects into the background scene, \
     matching lighting and style so the result reads as a single photograph.";

/// Errors that can occur when talking to the blend service.
#[derive(Debug, Error)]
pub enum BlendError {
    /// The blend endpoint URL provided by configuration is invalid.
    #[error("invalid blend endpoint URL: {0}")]
    InvalidUrl(String),
    /// The service could not be reached or answered with a server error.
    #[error("blend service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The service answered but produced no usable image.
    #[error("blend generation failed: {0}")]
    GenerationFailed(String),
}

impl BlendError {
    /// Returns true if this error is retryable (transient transport or
    /// server-side failures).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}

/// Configuration for retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_attempts: u32,
    /// Initial delay between retries in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between retries in milliseconds.
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 100,
            max_delay_ms: 10_000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay_ms,
            max_delay_ms,
            multiplier,
        }
    }

    /// Calculate delay for a given attempt number (0-indexed).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let base_delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay_ms as f64) as u64;
        // Add jitter: random value between 0 and 25% of delay
        let jitter = (capped_delay / 4).max(1);
        capped_delay.saturating_add(jitter / 2)
    }
}

/// Asynchronous client for the blend service.
#[derive(Debug, Clone)]
pub struct BlendClient {
    inner: Arc<InnerClient>,
}

#[derive(Debug)]
struct InnerClient {
    http: Client,
    endpoint: Url,
    retry_config: RetryConfig,
}

impl BlendClient {
    /// Create a new blend client with default retry configuration.
    ///
    /// `base_url` may be either the predict endpoint itself
    /// (`https://host/run/predict`) or just the host (in which case
    /// `/run/predict` is appended automatically).
    ///
    /// # Errors
    ///
    /// Returns [`BlendError::InvalidUrl`] if the URL is malformed.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, BlendError> {
        Self::with_retry_config(base_url, RetryConfig::default())
    }

    /// Create a new blend client with custom retry configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BlendError::InvalidUrl`] if the URL is malformed and
    /// [`BlendError::ServiceUnavailable`] if the HTTP client fails to
    /// build.
    pub fn with_retry_config(
        base_url: impl AsRef<str>,
        retry_config: RetryConfig,
    ) -> Result<Self, BlendError> {
        let mut url =
            Url::parse(base_url.as_ref()).map_err(|e| BlendError::InvalidUrl(e.to_string()))?;

        if url.path().is_empty() || url.path() == "/" {
            url.set_path("/run/predict");
        }

        let http = Client::builder()
            .user_agent(format!("montage/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BlendError::ServiceUnavailable(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            inner: Arc::new(InnerClient {
                http,
                endpoint: url,
                retry_config,
            }),
        })
    }

    /// Apply a free-text edit instruction to a composed image.
    ///
    /// # Errors
    ///
    /// [`BlendError::ServiceUnavailable`] when the service cannot be
    /// reached after retries; [`BlendError::GenerationFailed`] when it
    /// answers without a usable image (rejection, safety filter, empty
    /// result).
    pub async fn edit_image(
        &self,
        image_uri: &str,
        instruction: &str,
    ) -> Result<String, BlendError> {
        self.send_blend(vec![
            Value::String(image_uri.to_string()),
            Value::String(instruction.to_string()),
        ])
        .await
    }

    /// Remove the background from an image, returning the cutout as a
    /// data URI.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`BlendClient::edit_image`].
    pub async fn remove_background(&self, image_uri: &str) -> Result<String, BlendError> {
        self.send_blend(vec![Value::String(image_uri.to_string())])
            .await
    }

    async fn send_blend(&self, data: Vec<Value>) -> Result<String, BlendError> {
        let request = BlendRequest {
            fn_index: 0,
            data: &data,
        };

        let config = &self.inner.retry_config;
        let mut last_error: Option<BlendError> = None;

        for attempt in 0..config.max_attempts {
            // Perform HTTP request
            let http_result = self
                .inner
                .http
                .post(self.inner.endpoint.clone())
                .json(&request)
                .send()
                .await;

            let response = match http_result {
                Ok(resp) => resp,
                Err(e) => {
                    let error = BlendError::ServiceUnavailable(e.to_string());
                    if attempt + 1 < config.max_attempts {
                        let delay = config.delay_for_attempt(attempt);
                        warn!(
                            "Blend request failed (attempt {}/{}), retrying in {}ms: {}",
                            attempt + 1,
                            config.max_attempts,
                            delay,
                            error
                        );
                        tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                        last_error = Some(error);
                        continue;
                    }
                    return Err(error);
                }
            };

            let status = response.status();
            if status.is_server_error() {
                let error = BlendError::ServiceUnavailable(format!("service answered {status}"));
                if attempt + 1 < config.max_attempts {
                    let delay = config.delay_for_attempt(attempt);
                    warn!(
                        "Blend service error (attempt {}/{}), retrying in {}ms: {}",
                        attempt + 1,
                        config.max_attempts,
                        delay,
                        error
                    );
                    tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                    last_error = Some(error);
                    continue;
                }
                return Err(error);
            }

            // Well-formed rejections are not retryable
            if status.is_client_error() {
                return Err(BlendError::GenerationFailed(format!(
                    "service rejected the request: {status}"
                )));
            }

            let body: BlendResponse = response.json().await.map_err(|e| {
                BlendError::GenerationFailed(format!("unreadable service response: {e}"))
            })?;

            if let Some(message) = body.error {
                return Err(BlendError::GenerationFailed(message));
            }

            return body
                .data
                .first()
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    BlendError::GenerationFailed("service returned no image".to_string())
                });
        }

        // Should not reach here, but return last error if we do
        Err(last_error.unwrap_or_else(|| {
            BlendError::GenerationFailed("retry loop exited without result".to_string())
        }))
    }
}

#[derive(Debug, Serialize)]
struct BlendRequest<'a> {
    fn_index: u32,
    data: &'a [Value],
}

#[derive(Debug, Deserialize)]
struct BlendResponse {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
}
