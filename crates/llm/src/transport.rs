use async_trait::async_trait;
use peekaboo_common::Result;
use serde_json::Value;

/// JSON-over-HTTP transport used for the comment listing and the LLM call
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and parse the response body as JSON
    async fn get_json(&self, url: &str, headers: &[(String, String)]) -> Result<Value>;

    /// POST `body` as JSON to `url` and parse the response body as JSON
    async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<Value>;
}
