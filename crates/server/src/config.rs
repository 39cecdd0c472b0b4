//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required at startup
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Required per request (absence is reported when the handler runs)
//! - `SHOPIFY_API_KEY` - Shopify app client ID (install, callback)
//! - `SHOPIFY_API_SECRET` - Shopify app client secret (install, callback)
//! - `SHOPIFY_SCOPES` - Comma-separated OAuth scopes (install)
//! - `HOST` - Public URL of this service, e.g. `https://forge.example.com`
//!   (install, callback, `store_data`)
//! - `SHOPIFY_ACCESS_TOKEN` - Static Admin API token used by `publish`
//!
//! ## Optional
//! - `SERVER_HOST` - Bind address (default: 0.0.0.0)
//! - `SERVER_PORT` / `PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2025-01)
//! - `FINISH_URL` - Page the OAuth callback redirects to (default: `{HOST}/finish`)
//! - `HANDOFF_SWEEP_INTERVAL_SECS` - Expired-handoff sweep period (default: 60)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Sentry error tracking

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_API_VERSION: &str = "2025-01";
const DEFAULT_PORT: &str = "3000";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of this service (`HOST`)
    pub public_url: Option<String>,
    /// Where the OAuth callback sends the browser
    pub finish_url: Option<String>,
    /// Shopify app configuration
    pub shopify: ShopifyConfig,
    /// Period of the expired-handoff sweeper
    pub sweep_interval: Duration,
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

/// Shopify app configuration.
///
/// Every credential is optional at startup: handlers check for the values
/// they need and answer a configuration error when one is missing.
/// Implements `Debug` manually to redact credentials.
#[derive(Clone, Default)]
pub struct ShopifyConfig {
    /// OAuth client ID (`SHOPIFY_API_KEY`)
    pub api_key: Option<String>,
    /// OAuth client secret (`SHOPIFY_API_SECRET`)
    pub api_secret: Option<SecretString>,
    /// Requested OAuth scopes, comma-separated (`SHOPIFY_SCOPES`)
    pub scopes: Option<String>,
    /// Static Admin API token used for publishing (`SHOPIFY_ACCESS_TOKEN`)
    pub access_token: Option<SecretString>,
    /// Admin API version (e.g., 2025-01)
    pub api_version: String,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |set: bool| if set { "[REDACTED]" } else { "[UNSET]" };
        f.debug_struct("ShopifyConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &redact(self.api_secret.is_some()))
            .field("scopes", &self.scopes)
            .field("access_token", &redact(self.access_token.is_some()))
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Credentials needed to run the OAuth install redirect.
///
/// The secret signs the OAuth `state`.
#[derive(Debug, Clone)]
pub struct InstallCredentials<'a> {
    pub api_key: &'a str,
    pub api_secret: &'a SecretString,
    pub scopes: &'a str,
    pub redirect_uri: String,
}

/// Credentials needed to complete the OAuth callback.
#[derive(Clone, Copy)]
pub struct CallbackCredentials<'a> {
    pub api_key: &'a str,
    pub api_secret: &'a SecretString,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DATABASE_URL` is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("SERVER_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SERVER_HOST".to_string(), e.to_string()))?;
        let port = get_optional_env("SERVER_PORT")
            .or_else(|| get_optional_env("PORT"))
            .unwrap_or_else(|| DEFAULT_PORT.to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SERVER_PORT".to_string(), e.to_string()))?;
        let public_url = get_optional_env("HOST").map(|u| u.trim_end_matches('/').to_string());
        let finish_url = get_optional_env("FINISH_URL");
        let sweep_interval = get_optional_env("HANDOFF_SWEEP_INTERVAL_SECS")
            .map(|s| {
                s.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "HANDOFF_SWEEP_INTERVAL_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);

        Ok(Self {
            database_url,
            host,
            port,
            public_url,
            finish_url,
            shopify: ShopifyConfig::from_env(),
            sweep_interval: Duration::from_secs(sweep_interval.max(1)),
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

    /// Public URL of this service.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `HOST` is not set.
    pub fn public_url(&self) -> Result<&str, ConfigError> {
        self.public_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("HOST".to_string()))
    }

    /// The OAuth redirect URI registered with Shopify.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `HOST` is not set.
    pub fn callback_url(&self) -> Result<String, ConfigError> {
        Ok(format!("{}/api/callback", self.public_url()?))
    }

    /// The page the browser lands on after OAuth.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if neither `FINISH_URL` nor `HOST` is set.
    pub fn finish_url(&self) -> Result<String, ConfigError> {
        match &self.finish_url {
            Some(url) => Ok(url.clone()),
            None => Ok(format!("{}/finish", self.public_url()?)),
        }
    }

    /// Everything the install step needs, or the first missing variable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` naming the first absent value.
    pub fn install_credentials(&self) -> Result<InstallCredentials<'_>, ConfigError> {
        Ok(InstallCredentials {
            api_key: require(self.shopify.api_key.as_deref(), "SHOPIFY_API_KEY")?,
            api_secret: require(self.shopify.api_secret.as_ref(), "SHOPIFY_API_SECRET")?,
            scopes: require(self.shopify.scopes.as_deref(), "SHOPIFY_SCOPES")?,
            redirect_uri: self.callback_url()?,
        })
    }

    /// Everything the callback step needs, or the first missing variable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` naming the first absent value.
    pub fn callback_credentials(&self) -> Result<CallbackCredentials<'_>, ConfigError> {
        Ok(CallbackCredentials {
            api_key: require(self.shopify.api_key.as_deref(), "SHOPIFY_API_KEY")?,
            api_secret: require(self.shopify.api_secret.as_ref(), "SHOPIFY_API_SECRET")?,
        })
    }

    /// Static Admin API token used by the publisher.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `SHOPIFY_ACCESS_TOKEN` is not set.
    pub fn publish_token(&self) -> Result<&SecretString, ConfigError> {
        require(self.shopify.access_token.as_ref(), "SHOPIFY_ACCESS_TOKEN")
    }
}

impl ShopifyConfig {
    fn from_env() -> Self {
        let api_secret = get_optional_env("SHOPIFY_API_SECRET").map(|secret| {
            if let Err(e) = validate_secret_strength(&secret, "SHOPIFY_API_SECRET") {
                tracing::warn!("SHOPIFY_API_SECRET validation warning: {e}");
            }
            SecretString::from(secret)
        });
        let access_token = get_optional_env("SHOPIFY_ACCESS_TOKEN").map(|token| {
            if let Err(e) = validate_secret_strength(&token, "SHOPIFY_ACCESS_TOKEN") {
                tracing::warn!("SHOPIFY_ACCESS_TOKEN validation warning: {e}");
            }
            SecretString::from(token)
        });

        Self {
            api_key: get_optional_env("SHOPIFY_API_KEY"),
            api_secret,
            scopes: get_optional_env("SHOPIFY_SCOPES"),
            access_token,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn require<'a, T: ?Sized>(value: Option<&'a T>, key: &str) -> Result<&'a T, ConfigError> {
    value.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Configuration with only a database URL set, for unit tests.
#[cfg(test)]
pub(crate) fn bare_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/test"),
        host: IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        public_url: None,
        finish_url: None,
        shopify: ShopifyConfig {
            api_version: DEFAULT_API_VERSION.to_string(),
            ..ShopifyConfig::default()
        },
        sweep_interval: Duration::from_secs(60),
        json_logs: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 1.0,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-secret-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let addr = bare_config().socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_install_credentials_report_missing_values() {
        let mut config = bare_config();
        let err = config.install_credentials().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "SHOPIFY_API_KEY"));

        config.shopify.api_key = Some("key".to_string());
        let err = config.install_credentials().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "SHOPIFY_API_SECRET"));

        config.shopify.api_secret = Some(SecretString::from("shpss_secret"));
        config.shopify.scopes = Some("write_themes".to_string());
        let err = config.install_credentials().unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == "HOST"));

        config.public_url = Some("https://forge.test".to_string());
        let creds = config.install_credentials().unwrap();
        assert_eq!(creds.scopes, "write_themes");
        assert_eq!(creds.redirect_uri, "https://forge.test/api/callback");
    }

    #[test]
    fn test_finish_url_defaults_to_host() {
        let mut config = bare_config();
        assert!(config.finish_url().is_err());

        config.public_url = Some("https://forge.test".to_string());
        assert_eq!(config.finish_url().unwrap(), "https://forge.test/finish");
        assert_eq!(
            config.callback_url().unwrap(),
            "https://forge.test/api/callback"
        );

        config.finish_url = Some("https://app.test/done".to_string());
        assert_eq!(config.finish_url().unwrap(), "https://app.test/done");
    }

    #[test]
    fn test_shopify_config_debug_redacts_secrets() {
        let config = ShopifyConfig {
            api_key: Some("client_id_123".to_string()),
            api_secret: Some(SecretString::from("super_secret_value")),
            scopes: Some("write_themes".to_string()),
            access_token: Some(SecretString::from("shpat_super_secret")),
            api_version: DEFAULT_API_VERSION.to_string(),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("client_id_123"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_value"));
        assert!(!debug_output.contains("shpat_super_secret"));
    }
}
