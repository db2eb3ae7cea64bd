//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FIREBASE_DATABASE_URL` - Realtime Database root URL
//! - `FIREBASE_API_KEY` - Firebase project web API key
//! - `ADMIN_EMAILS` - Comma-separated allowlist of back-office accounts
//!
//! ## Optional
//! - `FIREBASE_DATABASE_SECRET` - Database secret sent as `auth` (high entropy)
//! - `FIREBASE_AUTH_URL` - Identity Toolkit base URL (default: Google's endpoint)
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: `PORT`, then 3001)
//! - `ADMIN_BASE_URL` - Public URL for the admin panel (default: http://localhost:3001)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 1.0)
//!
//! ## Optional (Cloudinary - enables image uploads)
//! - `CLOUDINARY_CLOUD_NAME` - Cloud name
//! - `CLOUDINARY_UPLOAD_PRESET` - Unsigned upload preset
//! - `CLOUDINARY_BASE_URL` - API base URL (default: <https://api.cloudinary.com>)
//!
//! ## Optional (SumUp - payment proxy)
//! - `SUMUP_BASE_URL` - API base URL (default: <https://api.sumup.com>)
//! - `SUMUP_BEARER_TOKEN` - API key or access token; proxy calls fail with 500 when unset
//! - `SUMUP_MERCHANT_CODE` - Merchant code for transaction history

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use vapeshop_core::Email;
use vapeshop_firebase::{DEFAULT_IDENTITY_URL, DatabaseConfig, IdentityConfig};

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default Cloudinary API origin.
pub const DEFAULT_CLOUDINARY_URL: &str = "https://api.cloudinary.com";

/// Default SumUp API origin.
pub const DEFAULT_SUMUP_URL: &str = "https://api.sumup.com";

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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Firebase project settings
    pub firebase: FirebaseConfig,
    /// Accounts allowed into the back-office (normalized, lowercase)
    pub admin_emails: Vec<Email>,
    /// Cloudinary settings (optional - enables image uploads)
    pub cloudinary: Option<CloudinaryConfig>,
    /// SumUp settings
    pub sumup: SumUpConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Firebase connection settings.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
}

/// Cloudinary unsigned upload settings.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub base_url: String,
}

/// SumUp API settings.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct SumUpConfig {
    pub base_url: String,
    pub bearer_token: Option<SecretString>,
    pub merchant_code: Option<String>,
}

impl std::fmt::Debug for SumUpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SumUpConfig")
            .field("base_url", &self.base_url)
            .field(
                "bearer_token",
                &self.bearer_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("merchant_code", &self.merchant_code)
            .finish()
    }
}

impl AdminConfig {
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

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_port("ADMIN_PORT", 3001)?;
        let base_url = get_env_or_default("ADMIN_BASE_URL", "http://localhost:3001");
        let admin_emails = parse_admin_emails(&get_required_env("ADMIN_EMAILS")?)?;

        Ok(Self {
            host,
            port,
            base_url,
            firebase: FirebaseConfig::from_env()?,
            admin_emails,
            cloudinary: CloudinaryConfig::from_env()?,
            sumup: SumUpConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_rate("SENTRY_TRACES_SAMPLE_RATE", 1.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the panel is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// Whether `email` is on the back-office allowlist.
    #[must_use]
    pub fn is_admin(&self, email: &Email) -> bool {
        self.admin_emails.contains(email)
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

impl CloudinaryConfig {
    /// Load Cloudinary configuration from environment.
    ///
    /// Returns `None` if neither variable is set (uploads disabled).
    /// Cloud name and preset must be set together.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cloud_name = get_optional_env("CLOUDINARY_CLOUD_NAME");
        let upload_preset = get_optional_env("CLOUDINARY_UPLOAD_PRESET");

        match (cloud_name, upload_preset) {
            (Some(cloud_name), Some(upload_preset)) => Ok(Some(Self {
                cloud_name,
                upload_preset,
                base_url: get_env_or_default("CLOUDINARY_BASE_URL", DEFAULT_CLOUDINARY_URL),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "CLOUDINARY_*".to_string(),
                "Both CLOUDINARY_CLOUD_NAME and CLOUDINARY_UPLOAD_PRESET must be set together"
                    .to_string(),
            )),
        }
    }
}

impl SumUpConfig {
    /// Load SumUp configuration from environment.
    ///
    /// A missing token is not a startup error; the proxy reports it per request.
    fn from_env() -> Self {
        let bearer_token = get_optional_env("SUMUP_BEARER_TOKEN").map(|token| {
            if let Err(e) = validate_secret_strength(&token, "SUMUP_BEARER_TOKEN") {
                tracing::warn!("SUMUP_BEARER_TOKEN validation warning: {e}");
            }
            SecretString::from(token)
        });

        Self {
            base_url: get_env_or_default("SUMUP_BASE_URL", DEFAULT_SUMUP_URL),
            bearer_token,
            merchant_code: get_optional_env("SUMUP_MERCHANT_CODE"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the comma-separated allowlist.
fn parse_admin_emails(raw: &str) -> Result<Vec<Email>, ConfigError> {
    let emails = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Email::parse(s).map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_EMAILS".to_string(), format!("{s}: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if emails.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            "ADMIN_EMAILS".to_string(),
            "must list at least one email".to_string(),
        ));
    }
    Ok(emails)
}

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

    #[test]
    fn test_parse_admin_emails_normalizes() {
        let emails = parse_admin_emails(" Owner@Shop.com, ,staff@shop.com ").unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails.first().unwrap().as_str(), "owner@shop.com");
    }

    #[test]
    fn test_parse_admin_emails_rejects_invalid() {
        assert!(matches!(
            parse_admin_emails("owner@shop.com,not-an-email"),
            Err(ConfigError::InvalidEnvVar(..))
        ));
        assert!(matches!(
            parse_admin_emails(" , "),
            Err(ConfigError::InvalidEnvVar(..))
        ));
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-token-here", "TEST");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(..))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("sup_sk_9fK2xQ7mLw4pR8vZ", "TEST").is_ok());
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("abababab");
        assert!((entropy - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_sumup_config_debug_redacts_token() {
        let config = SumUpConfig {
            base_url: DEFAULT_SUMUP_URL.to_string(),
            bearer_token: Some(SecretString::from("sup_sk_live_abc123")),
            merchant_code: Some("MC123".to_string()),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sup_sk_live_abc123"));
        assert!(debug.contains("MC123"));
    }
}
