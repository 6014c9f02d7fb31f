use async_trait::async_trait;
use peekaboo_common::config::MAX_RETRIES_LIMIT;
use peekaboo_common::{AppConfig, PeekabooError, Result};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::transport::Transport;

/// Longest response excerpt carried in an error message
const ERROR_BODY_EXCERPT: usize = 200;

/// Upper bound for a single retry delay
const MAX_BACKOFF_SECS: u64 = 30;

/// How a single attempt failed
enum AttemptError {
    /// Worth another attempt (connection problems, 5xx, 429)
    Retryable(PeekabooError),
    /// Repeating the request cannot help (bad header, 4xx, non-JSON body)
    Fatal(PeekabooError),
}

/// reqwest-backed transport with timeout and exponential backoff
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    max_retries: u32,
}

impl HttpTransport {
    /// Create new HTTP transport
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("peekaboo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        info!(
            "HTTP transport initialized: timeout={:?}, max_retries={}",
            timeout, max_retries
        );
        Ok(Self {
            client,
            max_retries: max_retries.clamp(1, MAX_RETRIES_LIMIT),
        })
    }

    /// Create transport from settings
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            Duration::from_secs(config.request_timeout_secs),
            config.max_retries,
        )
    }

    /// Send with retry; delays double from one second up to `MAX_BACKOFF_SECS`
    async fn send_with_retry(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        debug!(
            "Sending {} request - URL: {}, Headers: {}, Body: {}",
            method,
            url,
            headers.len(),
            body.is_some()
        );

        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.try_send(method.clone(), url, headers, body).await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable(e)) => {
                    if attempt < self.max_retries {
                        let delay = backoff_delay(attempt);
                        warn!(
                            "Request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            attempt, self.max_retries, e, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PeekabooError::network("All retries failed")))
    }

    /// Single attempt
    async fn try_send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<&Value>,
    ) -> std::result::Result<Value, AttemptError> {
        let mut request = self.client.request(method, url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                AttemptError::Fatal(PeekabooError::invalid_input(format!("Invalid request: {}", e)))
            } else {
                AttemptError::Retryable(PeekabooError::network(format!("Failed to send request: {}", e)))
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AttemptError::Retryable(PeekabooError::network(format!("Failed to read response body: {}", e)))
        })?;

        debug!("Received response - Status: {}, Length: {}", status, text.len());

        if !status.is_success() {
            let err = PeekabooError::network(format!(
                "{} returned {}: {}",
                url,
                status,
                excerpt(&text, ERROR_BODY_EXCERPT)
            ));
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                AttemptError::Retryable(err)
            } else {
                AttemptError::Fatal(err)
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            AttemptError::Fatal(PeekabooError::network(format!(
                "Failed to parse response from {}: {}",
                url, e
            )))
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str, headers: &[(String, String)]) -> Result<Value> {
        self.send_with_retry(Method::GET, url, headers, None).await
    }

    async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<Value> {
        self.send_with_retry(Method::POST, url, headers, Some(body)).await
    }
}

/// Wait before the attempt following `attempt` (1-based)
fn backoff_delay(attempt: u32) -> Duration {
    let secs = 2u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_secs(secs.min(MAX_BACKOFF_SECS))
}

/// First `max_chars` characters of `text`
fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
