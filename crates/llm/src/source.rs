use peekaboo_common::{AppConfig, PeekabooError, Result};
use peekaboo_template::{interpolate, Fallback, Values};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::transport::Transport;

/// Reject names that could not be an account name
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(PeekabooError::invalid_input("Username cannot be empty"));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(PeekabooError::invalid_input(format!(
            "Invalid username '{}': only letters, digits, '_' and '-' are allowed",
            username
        )));
    }
    Ok(())
}

/// Fetches a user's comment history listing
#[derive(Clone)]
pub struct CommentSource {
    transport: Arc<dyn Transport>,
    url_template: String,
    cookie: Option<String>,
}

impl CommentSource {
    pub fn new(transport: Arc<dyn Transport>, url_template: impl Into<String>, cookie: Option<String>) -> Self {
        Self {
            transport,
            url_template: url_template.into(),
            cookie,
        }
    }

    /// Comment source configured from settings
    pub fn from_config(transport: Arc<dyn Transport>, config: &AppConfig) -> Self {
        Self::new(transport, config.comments_url.clone(), config.cookie.clone())
    }

    /// History URL for `username`
    pub fn comments_url(&self, username: &str) -> Result<String> {
        validate_username(username)?;
        let values = HashMap::from([("username".to_string(), username.to_string())]);
        Ok(interpolate(&self.url_template, Values::Named(&values), Fallback::default()))
    }

    /// Fetch the raw listing JSON for `username`
    pub async fn fetch(&self, username: &str) -> Result<Value> {
        let url = self.comments_url(username)?;
        info!("Fetching comment history for {}", username);

        let headers: Vec<(String, String)> = self
            .cookie
            .iter()
            .map(|cookie| ("Cookie".to_string(), cookie.clone()))
            .collect();

        let listing = self.transport.get_json(&url, &headers).await?;
        debug!("Fetched comment listing from {}", url);
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get_json(&self, url: &str, headers: &[(String, String)]) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), headers.to_vec()));
            Ok(json!({"data": {"children": []}}))
        }

        async fn post_json(&self, _url: &str, _headers: &[(String, String)], _body: &Value) -> Result<Value> {
            unreachable!("comment source never posts")
        }
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("spez").is_ok());
        assert!(validate_username("Some_User-42").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("../admin").is_err());
        assert!(validate_username("a b").is_err());
    }

    #[test]
    fn test_comments_url() {
        let source = CommentSource::from_config(Arc::new(RecordingTransport::default()), &AppConfig::default());
        assert_eq!(
            source.comments_url("spez").unwrap(),
            "https://www.reddit.com/user/spez.json"
        );
        assert!(source.comments_url("bad/name").is_err());
    }

    #[tokio::test]
    async fn test_fetch_sends_cookie_header() {
        let transport = Arc::new(RecordingTransport::default());
        let source = CommentSource::new(
            transport.clone(),
            "https://example.com/u/{$username}/comments.json",
            Some("session=abc".to_string()),
        );

        let listing = source.fetch("someone").await.unwrap();
        assert_eq!(listing, json!({"data": {"children": []}}));

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "https://example.com/u/someone/comments.json");
        assert_eq!(
            calls[0].1,
            vec![("Cookie".to_string(), "session=abc".to_string())]
        );
    }
}
