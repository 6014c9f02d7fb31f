//! Built-in endpoint presets and default templates

use std::fmt;
use std::str::FromStr;

use serde_json::json;

use crate::config::RequestHeader;

/// Prompt template. `{$commentJsonData}` receives the mapped comments and
/// `{$username}` the account name.
pub const DEFAULT_LLM_PROMPT: &str = "Please review this user's Reddit comments and provide a summary of their behavior: {$commentJsonData}";

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_OLLAMA_API_URL: &str = "http://localhost:11434/api/generate";

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo-0125";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

pub const DEFAULT_OPENAI_RESPONSE_PATH: &str = "choices[0].message.content";
pub const DEFAULT_OLLAMA_RESPONSE_PATH: &str = "response";

/// Field mapping applied to each entry of the comment listing
pub const DEFAULT_COMMENT_MAPPER: &str = r#"{
  "c": "data.body",
  "subr": "data.subreddit",
  "upvotes": "data.ups",
  "threadtitle": "data.link_title",
  "issubmitter": "data.is_submitter"
}"#;

/// Comment history endpoint; `{$username}` is filled in per request
pub const DEFAULT_COMMENTS_URL: &str = "https://www.reddit.com/user/{$username}.json";

/// Log file name used when a log directory is configured
pub const DEFAULT_LOG_FILE: &str = "peekaboo.log";

/// Location of the record array inside the listing
pub use peekaboo_mapper::DEFAULT_RECORDS_PATH;

/// Placeholder the request body template receives the prompt through
const PROMPT_PLACEHOLDER: &str = "{$llmPrompt}";

/// Endpoint preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    OpenAi,
    Ollama,
}

impl Preset {
    pub fn api_url(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_API_URL,
            Self::Ollama => DEFAULT_OLLAMA_API_URL,
        }
    }

    pub fn model(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_MODEL,
            Self::Ollama => DEFAULT_OLLAMA_MODEL,
        }
    }

    /// Request body template; the prompt placeholder sits inside a JSON
    /// string literal
    pub fn payload_object(self) -> String {
        let body = match self {
            Self::OpenAi => json!({
                "model": self.model(),
                "messages": [{"role": "user", "content": PROMPT_PLACEHOLDER}],
                "temperature": 0.7
            }),
            Self::Ollama => json!({
                "model": self.model(),
                "prompt": PROMPT_PLACEHOLDER,
                "stream": false
            }),
        };
        format!("{:#}", body)
    }

    pub fn response_path(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_RESPONSE_PATH,
            Self::Ollama => DEFAULT_OLLAMA_RESPONSE_PATH,
        }
    }

    /// Default request headers; only the hosted API needs a bearer token
    pub fn request_headers(self) -> Vec<RequestHeader> {
        let content_type = RequestHeader::new("Content-Type", "application/json");
        match self {
            Self::OpenAi => vec![
                RequestHeader::new("Authorization", "Bearer {$apiKey}"),
                content_type,
            ],
            Self::Ollama => vec![content_type],
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(format!("Unknown preset '{}' (expected openai or ollama)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_from_str() {
        assert_eq!("openai".parse::<Preset>(), Ok(Preset::OpenAi));
        assert_eq!("Ollama".parse::<Preset>(), Ok(Preset::Ollama));
        assert!("claude".parse::<Preset>().is_err());
    }

    #[test]
    fn test_default_templates_are_valid_json_shapes() {
        for preset in [Preset::OpenAi, Preset::Ollama] {
            // With an empty prompt the body must already be well-formed JSON
            let body = preset.payload_object().replace("{$llmPrompt}", "");
            assert!(serde_json::from_str::<serde_json::Value>(&body).is_ok());
        }
        assert!(serde_json::from_str::<serde_json::Value>(DEFAULT_COMMENT_MAPPER).is_ok());
    }

    #[test]
    fn test_payload_names_preset_model() {
        let openai: serde_json::Value =
            serde_json::from_str(&Preset::OpenAi.payload_object()).unwrap();
        assert_eq!(openai["model"], DEFAULT_OPENAI_MODEL);
        assert_eq!(openai["messages"][0]["content"], "{$llmPrompt}");

        let ollama: serde_json::Value =
            serde_json::from_str(&Preset::Ollama.payload_object()).unwrap();
        assert_eq!(ollama["model"], DEFAULT_OLLAMA_MODEL);
        assert_eq!(ollama["stream"], false);

        // Key order of the template is kept
        let keys: Vec<_> = ollama.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["model", "prompt", "stream"]);
    }

    #[test]
    fn test_ollama_headers_have_no_authorization() {
        let headers = Preset::Ollama.request_headers();
        assert!(headers.iter().all(|h| h.key != "Authorization"));
        assert_eq!(Preset::OpenAi.request_headers().len(), 2);
    }
}
