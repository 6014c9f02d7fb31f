//! Request assembly from user templates

use peekaboo_common::{AppConfig, PeekabooError, RequestHeader, Result};
use peekaboo_mapper::{extract_value, MappedRecord};
use peekaboo_template::{interpolate, Fallback, Values};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::types::{Headers, LlmRequest};

/// Escape backslashes and double quotes so `s` can sit inside a JSON string
/// literal of a payload template
pub fn escape_json_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Fill the prompt template with the serialized comments and the username
pub fn build_prompt(template: &str, comments: &[MappedRecord], username: &str) -> Result<String> {
    let comment_json = serde_json::to_string(comments)?;
    debug!(
        "Serialized {} comments for prompt - Length: {} chars",
        comments.len(),
        comment_json.len()
    );

    let values = HashMap::from([
        ("commentJsonData".to_string(), escape_json_string(&comment_json)),
        ("username".to_string(), username.to_string()),
    ]);
    Ok(interpolate(template, Values::Named(&values), Fallback::default()))
}

/// Fill the body template with the prompt and parse it as JSON
pub fn build_payload(template: &str, prompt: &str) -> Result<Value> {
    let values = HashMap::from([("llmPrompt".to_string(), prompt.to_string())]);
    let body = interpolate(template, Values::Named(&values), Fallback::default());

    serde_json::from_str(&body)
        .map_err(|e| PeekabooError::payload(format!("Error parsing JSON payload: {}", e)))
}

/// Resolve header value templates against the API key.
///
/// A repeated header name (compared case-insensitively) keeps its first
/// position and takes the last value.
pub fn build_headers(headers: &[RequestHeader], api_key: &str) -> Headers {
    let values = HashMap::from([("apiKey".to_string(), api_key.to_string())]);
    let mut resolved: Headers = Vec::with_capacity(headers.len());

    for header in headers {
        let value = interpolate(&header.value, Values::Named(&values), Fallback::default());
        match resolved
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&header.key))
        {
            Some(existing) => existing.1 = value,
            None => resolved.push((header.key.clone(), value)),
        }
    }

    resolved
}

impl LlmRequest {
    /// Build the complete request for `username` from settings
    pub fn from_config(config: &AppConfig, comments: &[MappedRecord], username: &str) -> Result<Self> {
        if config.api_url.trim().is_empty() {
            return Err(PeekabooError::config("API URL is missing"));
        }

        let prompt = build_prompt(&config.llm_prompt, comments, username)?;
        let body = build_payload(&config.payload_object, &prompt)?;
        let headers = build_headers(&config.request_headers, &config.api_key);

        Ok(Self {
            url: config.api_url.clone(),
            headers,
            body,
        })
    }
}

/// Pull the generated text out of an LLM response.
///
/// Strings are returned as-is, other JSON values in compact form. An empty
/// path selects the whole response.
pub fn extract_response_text(response: &Value, path: &str) -> Option<String> {
    let value = if path.is_empty() {
        Some(response)
    } else {
        extract_value(response, path)
    };

    match value? {
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
