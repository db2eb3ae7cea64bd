//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIREBASE_DATABASE_URL` - Realtime Database root URL
//! - `FIREBASE_API_KEY` - Firebase project web API key
//! - `WHATSAPP_NUMBER` - Shop WhatsApp number orders are handed off to
//!
//! ## Optional
//! - `FIREBASE_DATABASE_SECRET` - Database secret sent as `auth` (high entropy)
//! - `FIREBASE_AUTH_URL` - Identity Toolkit base URL (default: Google's endpoint)
//! - `CATALOG_FALLBACK_PATH` - Bundled catalog JSON (default: crates/storefront/data/catalog.json)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port, falling back to `PORT` (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: http://localhost:3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use vapeshop_core::Phone;
use vapeshop_firebase::{DEFAULT_IDENTITY_URL, DatabaseConfig, IdentityConfig};

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_FALLBACK_PATH: &str = "crates/storefront/data/catalog.json";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Firebase project settings
    pub firebase: FirebaseConfig,
    /// Shop number for the WhatsApp hand-off
    pub whatsapp_number: Phone,
    /// Catalog JSON served when the database is unreachable
    pub catalog_fallback_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Firebase connection settings.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_port("STOREFRONT_PORT", 3000)?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");

        let firebase = FirebaseConfig::from_env()?;
        let whatsapp_number = Phone::parse(&get_required_env("WHATSAPP_NUMBER")?).map_err(|e| {
            ConfigError::InvalidEnvVar("WHATSAPP_NUMBER".to_string(), e.to_string())
        })?;
        let catalog_fallback_path =
            PathBuf::from(get_env_or_default("CATALOG_FALLBACK_PATH", DEFAULT_FALLBACK_PATH));

        Ok(Self {
            host,
            port,
            base_url,
            firebase,
            whatsapp_number,
            catalog_fallback_path,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 0.1)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl FirebaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = get_optional_env("FIREBASE_DATABASE_SECRET")
            .map(|value| {
                validate_secret_strength(&value, "FIREBASE_DATABASE_SECRET")?;
                Ok::<_, ConfigError>(SecretString::from(value))
            })
            .transpose()?;

        Ok(Self {
            database: DatabaseConfig {
                url: get_required_env("FIREBASE_DATABASE_URL")?,
                secret,
            },
            identity: IdentityConfig {
                api_key: get_required_secret("FIREBASE_API_KEY")?,
                base_url: get_env_or_default("FIREBASE_AUTH_URL", DEFAULT_IDENTITY_URL),
            },
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Listen port from `key`, then the platform-provided `PORT`.
fn get_port(key: &str, default: u16) -> Result<u16, ConfigError> {
    let (name, raw) = match (get_optional_env(key), get_optional_env("PORT")) {
        (Some(v), _) => (key, v),
        (None, Some(v)) => ("PORT", v),
        (None, None) => return Ok(default),
    };
    raw.parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
}

/// Parse a sample rate in `0.0..=1.0`.
fn get_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be between 0.0 and 1.0".to_string(),
        ));
    }
    Ok(rate)
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
    let len = s.len() as f64;
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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            firebase: FirebaseConfig {
                database: DatabaseConfig {
                    url: "https://shop-default-rtdb.firebaseio.com".to_string(),
                    secret: Some(SecretString::from("k9$Qz!x7Lw2@pR4")),
                },
                identity: IdentityConfig {
                    api_key: SecretString::from("AIzaSyD-real-key"),
                    base_url: DEFAULT_IDENTITY_URL.to_string(),
                },
            },
            whatsapp_number: Phone::parse("+57 300 000 0000").unwrap(),
            catalog_fallback_path: PathBuf::from(DEFAULT_FALLBACK_PATH),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

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
        let result = validate_secret_strength("your-database-secret", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_socket_addr_and_secure() {
        let mut config = config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());

        config.base_url = "https://shop.example.co".to_string();
        assert!(config.is_secure());
    }

    #[test]
    fn test_debug_redacts_firebase_secrets() {
        let debug_output = format!("{:?}", config());
        assert!(debug_output.contains("firebaseio.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("k9$Qz!x7Lw2@pR4"));
        assert!(!debug_output.contains("AIzaSyD-real-key"));
    }
}
