//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion provider configuration
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Speech synthesis provider configuration
    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    /// Session store configuration
    #[serde(default)]
    pub session: SessionConfig,
}

impl Settings {
    /// Load settings from `config.toml` (optional) and the environment.
    ///
    /// Structured overrides use the `CALL_AGENT` prefix with `__` as the
    /// section separator (e.g. `CALL_AGENT__SERVER__PORT=8080`). The bare
    /// variables used by earlier deployments (`OPENAI_API_KEY`,
    /// `ELEVENLABS_API_KEY`, `PORT`) take precedence when set.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings: Settings = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("CALL_AGENT").separator("__"))
            .build()?
            .try_deserialize()?;

        settings.apply_legacy_env();
        settings.validate()?;
        Ok(settings)
    }

    fn apply_legacy_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("ELEVENLABS_API_KEY") {
            self.elevenlabs.api_key = Some(key);
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.cleanup_grace_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.cleanup_grace_secs".to_string(),
                message: "grace window must be at least one second".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "openai.temperature".to_string(),
                message: format!("{} is outside 0.0..=2.0", self.openai.temperature),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Completion provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key; absent or the dummy value means scripted fallback mode
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat model
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// API base URL, without trailing slash
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl OpenAiConfig {
    /// True when a real key is present (the dummy test key does not count)
    pub fn is_configured(&self) -> bool {
        matches!(&self.api_key, Some(key) if key != "sk-dummy-key-for-testing")
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            temperature: default_temperature(),
            base_url: default_openai_base_url(),
        }
    }
}

/// Speech synthesis provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    /// API key; absent or the test value disables synthesis
    #[serde(default)]
    pub api_key: Option<String>,

    /// Voice identifier ("Rachel" by default)
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// Synthesis model
    #[serde(default = "default_tts_model")]
    pub model_id: String,

    /// Voice stability setting
    #[serde(default = "default_voice_setting")]
    pub stability: f32,

    /// Voice similarity boost setting
    #[serde(default = "default_voice_setting")]
    pub similarity_boost: f32,

    /// API base URL, without trailing slash
    #[serde(default = "default_elevenlabs_base_url")]
    pub base_url: String,
}

impl ElevenLabsConfig {
    /// True when a real key is present (the test key does not count)
    pub fn is_configured(&self) -> bool {
        matches!(&self.api_key, Some(key) if key != "test-key")
    }
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            voice_id: default_voice_id(),
            model_id: default_tts_model(),
            stability: default_voice_setting(),
            similarity_boost: default_voice_setting(),
            base_url: default_elevenlabs_base_url(),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long an ended call stays addressable before removal
    #[serde(default = "default_grace_secs")]
    pub cleanup_grace_secs: u64,

    /// Interval between background sweeps of expired entries
    #[serde(default = "default_sweep_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cleanup_grace_secs: default_grace_secs(),
            sweep_interval_secs: default_sweep_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_voice_id() -> String {
    // ElevenLabs' stock "Rachel" voice
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_tts_model() -> String {
    "eleven_monolingual_v1".to_string()
}

fn default_voice_setting() -> f32 {
    0.5
}

fn default_grace_secs() -> u64 {
    60
}

fn default_sweep_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_fallback_mode() {
        let settings = Settings::default();

        assert!(!settings.openai.is_configured());
        assert!(!settings.elevenlabs.is_configured());
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.session.cleanup_grace_secs, 60);
    }

    #[test]
    fn test_dummy_keys_do_not_count_as_configured() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("sk-dummy-key-for-testing".to_string());
        settings.elevenlabs.api_key = Some("test-key".to_string());

        assert!(!settings.openai.is_configured());
        assert!(!settings.elevenlabs.is_configured());

        settings.openai.api_key = Some("sk-real".to_string());
        settings.elevenlabs.api_key = Some("el-real".to_string());

        assert!(settings.openai.is_configured());
        assert!(settings.elevenlabs.is_configured());
    }

    #[test]
    fn test_validate_rejects_zero_grace() {
        let mut settings = Settings::default();
        settings.session.cleanup_grace_secs = 0;

        assert!(settings.validate().is_err());
    }
}
