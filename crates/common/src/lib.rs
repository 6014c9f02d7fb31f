pub mod config;
pub mod error;
pub mod logger;
pub mod presets;

// Re-export commonly used types
pub use self::config::{AppConfig, RequestHeader};
pub use error::PeekabooError;
pub use presets::Preset;
pub type Result<T> = std::result::Result<T, PeekabooError>;
