use chrono::{DateTime, Utc};
use peekaboo_mapper::MappedBatch;
use serde::Serialize;
use serde_json::Value;

/// Ordered HTTP headers (name, value)
pub type Headers = Vec<(String, String)>;

/// Fully resolved LLM request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmRequest {
    /// Endpoint URL
    pub url: String,

    /// Headers with secrets substituted
    pub headers: Headers,

    /// Parsed request body
    pub body: Value,
}

impl LlmRequest {
    /// Copy with every occurrence of `secret` in header values masked
    pub fn redacted(&self, secret: &str) -> Self {
        let mut request = self.clone();
        if !secret.is_empty() {
            for (_, value) in request.headers.iter_mut() {
                *value = value.replace(secret, "********");
            }
        }
        request
    }
}

/// Mapped comments plus the request built from them
#[derive(Debug, Clone, Serialize)]
pub struct PreparedRequest {
    pub username: String,
    pub comments: MappedBatch,
    pub request: LlmRequest,
}

/// Summarization result
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Account the comments belong to
    pub username: String,

    /// Generated text found at the response path, if any
    pub text: Option<String>,

    /// Complete endpoint response
    pub raw_response: Value,

    /// Number of comments forwarded
    pub processed_comments: usize,

    /// Endpoint that produced the summary
    pub model_endpoint: String,

    /// Completion time
    pub created_at: DateTime<Utc>,
}

impl Summary {
    /// Create new summary
    pub fn new(
        username: String,
        text: Option<String>,
        raw_response: Value,
        processed_comments: usize,
        model_endpoint: String,
    ) -> Self {
        Self {
            username,
            text,
            raw_response,
            processed_comments,
            model_endpoint,
            created_at: Utc::now(),
        }
    }
}
