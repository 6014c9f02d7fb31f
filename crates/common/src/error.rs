/// Peekaboo error types
#[derive(Debug, thiserror::Error)]
pub enum PeekabooError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings source could not be read or deserialized
    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Interpolated request body is not valid JSON
    #[error("Payload error: {0}")]
    Payload(String),

    /// LLM endpoint returned something unusable
    #[error("LLM error: {0}")]
    Llm(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PeekabooError {
    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create payload error
    pub fn payload<S: Into<String>>(msg: S) -> Self {
        Self::Payload(msg.into())
    }

    /// Create LLM error
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Self::Llm(msg.into())
    }

    /// Create invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

// Process exit status for the CLI
impl PeekabooError {
    /// Get process exit code (sysexits-style)
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => 64,
            Self::Json(_) => 65,
            Self::Payload(_) => 65,
            Self::NotFound(_) => 66,
            Self::Network(_) => 69,
            Self::Llm(_) => 69,
            Self::Internal(_) => 70,
            Self::Other(_) => 70,
            Self::Io(_) => 74,
            Self::Config(_) => 78,
            Self::Settings(_) => 78,
        }
    }
}
