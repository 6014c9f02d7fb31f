use peekaboo_common::{AppConfig, PeekabooError, Result};
use peekaboo_mapper::{map_records_at, FieldMapping, MappedBatch};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::request::extract_response_text;
use crate::source::{validate_username, CommentSource};
use crate::transport::Transport;
use crate::types::{LlmRequest, PreparedRequest, Summary};

/// Summarizes a user's comment history through the configured LLM endpoint
pub struct Summarizer {
    transport: Arc<dyn Transport>,
    source: CommentSource,
    mapping: FieldMapping,
    config: AppConfig,
}

impl Summarizer {
    /// Create new summarizer; the comment mapper is parsed once here
    pub fn new(config: AppConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let mapping = FieldMapping::from_json(&config.comment_mapper)
            .map_err(|e| PeekabooError::config(format!("Invalid comment mapper: {}", e)))?;
        let source = CommentSource::from_config(transport.clone(), &config);

        Ok(Self {
            transport,
            source,
            mapping,
            config,
        })
    }

    /// Fetch the raw comment listing for `username`
    pub async fn fetch_comments(&self, username: &str) -> Result<Value> {
        self.source.fetch(username).await
    }

    /// Flatten a raw listing with the configured mapping and limit
    pub fn map_comments(&self, listing: &Value) -> MappedBatch {
        let batch = map_records_at(
            listing,
            &self.config.records_path,
            &self.mapping,
            self.config.max_comments,
        );
        debug!(
            "Mapped {} comments (limit {})",
            batch.processed_count, self.config.max_comments
        );
        batch
    }

    /// Everything up to the LLM call: map comments and build the request
    pub fn prepare(&self, username: &str, listing: &Value) -> Result<PreparedRequest> {
        validate_username(username)?;
        let comments = self.map_comments(listing);
        if comments.processed_count == 0 {
            return Err(PeekabooError::not_found(format!(
                "No comments found for {} at '{}'",
                username, self.config.records_path
            )));
        }

        let request = LlmRequest::from_config(&self.config, &comments.records, username)?;

        Ok(PreparedRequest {
            username: username.to_string(),
            comments,
            request,
        })
    }

    /// Fetch and summarize the comment history of `username`
    pub async fn summarize(&self, username: &str) -> Result<Summary> {
        let listing = self.fetch_comments(username).await?;
        self.summarize_listing(username, &listing).await
    }

    /// Summarize an already fetched listing
    pub async fn summarize_listing(&self, username: &str, listing: &Value) -> Result<Summary> {
        let prepared = self.prepare(username, listing)?;
        info!(
            "Sending {} comments for {} to {}",
            prepared.comments.processed_count, username, prepared.request.url
        );

        let response = self
            .transport
            .post_json(&prepared.request.url, &prepared.request.headers, &prepared.request.body)
            .await?;

        // Some endpoints report failures in a 2xx body
        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            let message = error
                .as_str()
                .or_else(|| error.get("message").and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(PeekabooError::llm(message));
        }

        let text = extract_response_text(&response, &self.config.llm_response_path);
        if text.is_none() {
            debug!(
                "Response path '{}' did not resolve, keeping raw response only",
                self.config.llm_response_path
            );
        }

        info!("Summary received for {}", username);
        Ok(Summary::new(
            username.to_string(),
            text,
            response,
            prepared.comments.processed_count,
            prepared.request.url,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use peekaboo_common::Preset;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves a fixed listing and a fixed LLM response, recording posts
    struct FakeTransport {
        listing: Value,
        response: Value,
        posts: Mutex<Vec<(String, Vec<(String, String)>, Value)>>,
    }

    impl FakeTransport {
        fn new(listing: Value, response: Value) -> Arc<Self> {
            Arc::new(Self {
                listing,
                response,
                posts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn get_json(&self, _url: &str, _headers: &[(String, String)]) -> Result<Value> {
            Ok(self.listing.clone())
        }

        async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<Value> {
            self.posts
                .lock()
                .unwrap()
                .push((url.to_string(), headers.to_vec(), body.clone()));
            Ok(self.response.clone())
        }
    }

    fn listing(count: usize) -> Value {
        let children: Vec<Value> = (0..count)
            .map(|i| json!({"kind": "t1", "data": {"body": format!("comment {i}"), "subreddit": "rust", "ups": i}}))
            .collect();
        json!({"kind": "Listing", "data": {"children": children}})
    }

    fn openai_config() -> AppConfig {
        let mut config = AppConfig::preset(Preset::OpenAi);
        config.api_key = "sk-test".to_string();
        config
    }

    #[test]
    fn test_invalid_mapper_is_config_error() {
        let mut config = openai_config();
        config.comment_mapper = "[]".to_string();
        let transport = FakeTransport::new(json!({}), json!({}));
        let err = Summarizer::new(config, transport).err().unwrap();
        assert!(matches!(err, PeekabooError::Config(_)));
    }

    #[test]
    fn test_prepare_respects_max_comments() {
        let mut config = openai_config();
        config.max_comments = 2;
        let summarizer = Summarizer::new(config, FakeTransport::new(json!({}), json!({}))).unwrap();

        let prepared = summarizer.prepare("someone", &listing(5)).unwrap();
        assert_eq!(prepared.comments.processed_count, 2);
        assert_eq!(prepared.request.headers[0].1, "Bearer sk-test");
        assert_eq!(prepared.request.body["model"], json!("gpt-3.5-turbo-0125"));
    }

    #[test]
    fn test_prepare_without_comments() {
        let summarizer = Summarizer::new(openai_config(), FakeTransport::new(json!({}), json!({}))).unwrap();
        let err = summarizer.prepare("someone", &json!({"data": {}})).unwrap_err();
        assert!(matches!(err, PeekabooError::NotFound(_)));
    }

    #[test]
    fn test_prepare_validates_username() {
        let summarizer = Summarizer::new(openai_config(), FakeTransport::new(json!({}), json!({}))).unwrap();
        let err = summarizer.prepare("some\"one", &listing(1)).unwrap_err();
        assert!(matches!(err, PeekabooError::InvalidInput(_)));
    }

    #[test]
    fn test_prepare_reports_broken_payload_template() {
        let mut config = openai_config();
        config.payload_object = r#"{"prompt": "{$llmPrompt}""#.to_string();
        let summarizer = Summarizer::new(config, FakeTransport::new(json!({}), json!({}))).unwrap();

        let err = summarizer.prepare("someone", &listing(1)).unwrap_err();
        assert!(matches!(err, PeekabooError::Payload(_)));
    }

    #[tokio::test]
    async fn test_summarize_openai_flow() {
        let transport = FakeTransport::new(
            listing(3),
            json!({"choices": [{"message": {"role": "assistant", "content": "Friendly Rustacean."}}]}),
        );
        let summarizer = Summarizer::new(openai_config(), transport.clone()).unwrap();

        let summary = summarizer.summarize("someone").await.unwrap();
        assert_eq!(summary.text.as_deref(), Some("Friendly Rustacean."));
        assert_eq!(summary.processed_comments, 3);
        assert_eq!(summary.model_endpoint, "https://api.openai.com/v1/chat/completions");

        let posts = transport.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        let content = posts[0].2["messages"][0]["content"].as_str().unwrap();
        assert!(content.contains(r#"{"c":"comment 0","subr":"rust","upvotes":0}"#));
    }

    #[tokio::test]
    async fn test_summarize_ollama_flow() {
        let transport = FakeTransport::new(listing(2), json!({"model": "llama3", "response": "Short.", "done": true}));
        let summarizer = Summarizer::new(AppConfig::preset(Preset::Ollama), transport.clone()).unwrap();

        let summary = summarizer.summarize_listing("someone", &listing(2)).await.unwrap();
        assert_eq!(summary.text.as_deref(), Some("Short."));

        let posts = transport.posts.lock().unwrap();
        assert_eq!(posts[0].0, "http://localhost:11434/api/generate");
        assert_eq!(posts[0].2["stream"], json!(false));
        assert_eq!(posts[0].1, vec![("Content-Type".to_string(), "application/json".to_string())]);
    }

    #[tokio::test]
    async fn test_summarize_error_body() {
        let transport = FakeTransport::new(
            listing(1),
            json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}),
        );
        let summarizer = Summarizer::new(openai_config(), transport).unwrap();

        let err = summarizer.summarize("someone").await.unwrap_err();
        assert!(matches!(err, PeekabooError::Llm(ref m) if m == "Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_summarize_plain_string_error_body() {
        let transport = FakeTransport::new(listing(1), json!({"error": "model 'llama9' not found"}));
        let summarizer = Summarizer::new(AppConfig::preset(Preset::Ollama), transport).unwrap();

        let err = summarizer.summarize("someone").await.unwrap_err();
        assert!(matches!(err, PeekabooError::Llm(ref m) if m == "model 'llama9' not found"));
    }

    #[tokio::test]
    async fn test_unresolved_response_path_keeps_raw_response() {
        let response = json!({"unexpected": "shape"});
        let summarizer = Summarizer::new(openai_config(), FakeTransport::new(listing(1), response.clone())).unwrap();

        let summary = summarizer.summarize("someone").await.unwrap();
        assert_eq!(summary.text, None);
        assert_eq!(summary.raw_response, response);
    }
}
