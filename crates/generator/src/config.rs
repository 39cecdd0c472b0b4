//! Generator configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CLAUDE_API_KEY` - Anthropic API key
//!
//! ## Optional
//! - `CLAUDE_MODEL` - Model ID (default: claude-sonnet-4-20250514)
//! - `GENERATOR_HOST` - Bind address (default: 0.0.0.0)
//! - `GENERATOR_PORT` / `PORT` - Listen port (default: 5000)
//! - `GENERATOR_MAX_TOKENS` - Output token budget (default: 4096)
//! - `LOG_FORMAT` - `json` for structured logs
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Sentry error tracking

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_PORT: &str = "5000";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Generator configuration.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Claude API configuration
    pub claude: ClaudeConfig,
    /// Emit JSON logs
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Claude API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model ID (e.g., claude-sonnet-4-20250514)
    pub model: String,
    /// Output token budget per request
    pub max_tokens: u32,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl GeneratorConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CLAUDE_API_KEY` is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("GENERATOR_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("GENERATOR_HOST".to_string(), e.to_string()))?;
        let port = get_optional_env("GENERATOR_PORT")
            .or_else(|| get_optional_env("PORT"))
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("GENERATOR_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            host,
            port,
            claude: ClaudeConfig::from_env()?,
            json_logs: get_optional_env("LOG_FORMAT").is_some_and(|f| f == "json"),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_optional_env("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ClaudeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = get_optional_env("CLAUDE_API_KEY")
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("CLAUDE_API_KEY".to_string()))?;
        let max_tokens = get_optional_env("GENERATOR_MAX_TOKENS")
            .map(|s| {
                s.parse::<u32>().map_err(|e| {
                    ConfigError::InvalidEnvVar("GENERATOR_MAX_TOKENS".to_string(), e.to_string())
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_TOKENS);

        Ok(Self {
            api_key,
            model: get_env_or_default("CLAUDE_MODEL", DEFAULT_MODEL),
            max_tokens,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claude_config_debug_redacts_key() {
        let config = ClaudeConfig {
            api_key: SecretString::from("sk-ant-very-secret"),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-ant-very-secret"));
        assert!(debug.contains(DEFAULT_MODEL));
    }

    #[test]
    fn test_socket_addr() {
        let config = GeneratorConfig {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            claude: ClaudeConfig {
                api_key: SecretString::from("k"),
                model: DEFAULT_MODEL.to_string(),
                max_tokens: DEFAULT_MAX_TOKENS,
            },
            json_logs: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
    }
}
