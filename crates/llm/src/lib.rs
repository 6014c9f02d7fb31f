//! Peekaboo LLM integration
//!
//! Comment history retrieval, request assembly from templates, and the
//! HTTP transport for a configurable LLM endpoint

mod client;
mod request;
mod source;
mod summarize;
mod transport;
mod types;

pub use client::HttpTransport;
pub use request::{build_headers, build_payload, build_prompt, escape_json_string, extract_response_text};
pub use source::{validate_username, CommentSource};
pub use summarize::Summarizer;
pub use transport::Transport;
pub use types::{Headers, LlmRequest, PreparedRequest, Summary};
