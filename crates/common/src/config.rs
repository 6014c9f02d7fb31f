use crate::error::PeekabooError;
use crate::presets::{self, Preset};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides (`PEEKABOO_API_KEY`, ...)
const ENV_PREFIX: &str = "PEEKABOO";

/// Largest accepted `max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// One HTTP header; `value` is a template that may reference `{$apiKey}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    pub key: String,
    pub value: String,
}

impl RequestHeader {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Peekaboo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// LLM endpoint receiving the request body
    pub api_url: String,

    /// Secret substituted for `{$apiKey}` in header values
    pub api_key: String,

    /// Prompt template (`{$commentJsonData}`, `{$username}`)
    pub llm_prompt: String,

    /// Request body template (`{$llmPrompt}`); must be JSON once filled in
    pub payload_object: String,

    /// Request headers with templated values
    pub request_headers: Vec<RequestHeader>,

    /// JSON object mapping output fields to comment paths
    pub comment_mapper: String,

    /// Maximum comments to forward; zero or negative means no limit
    pub max_comments: i64,

    /// Path of the generated text inside the LLM response
    pub llm_response_path: String,

    /// Comment history URL template (`{$username}`)
    pub comments_url: String,

    /// Path of the record array inside the comment listing
    pub records_path: String,

    /// Cookie header sent with the comment history request
    pub cookie: Option<String>,

    /// Log directory; console only when unset
    pub log_dir: Option<PathBuf>,

    /// Log file name inside `log_dir`
    pub log_file: String,

    /// Log level
    pub log_level: String,

    /// HTTP timeout in seconds
    pub request_timeout_secs: u64,

    /// Attempts per HTTP request
    pub max_retries: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

impl AppConfig {
    /// Default settings for an endpoint preset
    pub fn preset(preset: Preset) -> Self {
        Self {
            api_url: preset.api_url().to_string(),
            api_key: String::new(),
            llm_prompt: presets::DEFAULT_LLM_PROMPT.to_string(),
            payload_object: preset.payload_object(),
            request_headers: preset.request_headers(),
            comment_mapper: presets::DEFAULT_COMMENT_MAPPER.to_string(),
            max_comments: -1,
            llm_response_path: preset.response_path().to_string(),
            comments_url: presets::DEFAULT_COMMENTS_URL.to_string(),
            records_path: presets::DEFAULT_RECORDS_PATH.to_string(),
            cookie: None,
            log_dir: None,
            log_file: presets::DEFAULT_LOG_FILE.to_string(),
            log_level: "info".to_string(),
            request_timeout_secs: 300,
            max_retries: 3,
        }
    }

    /// Load settings with OpenAI defaults
    pub fn load(settings_path: Option<&Path>) -> Result<Self, PeekabooError> {
        Self::load_with_preset(settings_path, Preset::default())
    }

    /// Load settings: preset defaults, then the settings file (JSON or TOML,
    /// by extension), then `PEEKABOO_*` environment variables and `.env`
    pub fn load_with_preset(
        settings_path: Option<&Path>,
        preset: Preset,
    ) -> Result<Self, PeekabooError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        Self::load_from_sources(
            settings_path,
            preset,
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    /// Layer preset defaults, the settings file and `environment`
    fn load_from_sources(
        settings_path: Option<&Path>,
        preset: Preset,
        environment: Environment,
    ) -> Result<Self, PeekabooError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::preset(preset))?);

        if let Some(path) = settings_path {
            if !path.exists() {
                return Err(PeekabooError::config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        let config: Self = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// Log file location, when file logging is configured
    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_dir.as_ref().map(|dir| dir.join(&self.log_file))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), PeekabooError> {
        if self.api_url.trim().is_empty() {
            return Err(PeekabooError::config("API URL is missing"));
        }

        if !is_http_url(&self.api_url) {
            return Err(PeekabooError::config(
                "API URL must start with http:// or https://",
            ));
        }

        if !is_http_url(&self.comments_url) {
            return Err(PeekabooError::config(
                "Comments URL must start with http:// or https://",
            ));
        }

        if self.payload_object.trim().is_empty() {
            return Err(PeekabooError::config("Payload template cannot be empty"));
        }

        // Field mapping: a JSON object whose values are path strings
        let mapper: serde_json::Value = serde_json::from_str(&self.comment_mapper)
            .map_err(|e| PeekabooError::config(format!("Invalid JSON for comment mapper: {}", e)))?;
        match mapper.as_object() {
            Some(fields) if fields.values().all(|v| v.is_string()) => {}
            _ => {
                return Err(PeekabooError::config(
                    "Comment mapper must be a JSON object of path strings",
                ))
            }
        }

        if self.request_headers.iter().any(|h| h.key.trim().is_empty()) {
            return Err(PeekabooError::config("Request header names cannot be empty"));
        }

        if self.log_file.trim().is_empty() || self.log_file.contains(['/', '\\']) {
            return Err(PeekabooError::config("Log file must be a plain file name"));
        }

        if self.request_timeout_secs == 0 {
            return Err(PeekabooError::config("Request timeout cannot be 0"));
        }

        if self.max_retries == 0 {
            return Err(PeekabooError::config("Max retries cannot be 0"));
        }

        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(PeekabooError::config(format!(
                "Max retries cannot exceed {} (got {})",
                MAX_RETRIES_LIMIT, self.max_retries
            )));
        }

        Ok(())
    }

    /// Copy with secrets masked, for display
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.api_key.is_empty() {
            config.api_key = "********".to_string();
        }
        if config.cookie.is_some() {
            config.cookie = Some("********".to_string());
        }
        config
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
