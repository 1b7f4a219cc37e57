//! Configuration for the call agent
//!
//! Settings are loaded from an optional `config` file plus the environment,
//! with serde defaults for everything so the server boots credential-less
//! (scripted fallback mode) out of the box.

mod settings;

pub use settings::{
    ElevenLabsConfig, OpenAiConfig, ServerConfig, SessionConfig, Settings,
};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
