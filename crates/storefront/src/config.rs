//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CATALOG_API_URL` - Base URL of the catalog backend REST API
//! - `MAPS_API_KEY` - Geocoding/routing provider key (min entropy enforced)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: <http://localhost:3000>)
//! - `GEO_API_URL` - Base URL of the geo endpoints (default: `CATALOG_API_URL`)
//! - `SERVICE_REGION` - Region bias for address suggestions (default: Nasca, Perú)
//! - `STORE_ORIGIN_LAT` / `STORE_ORIGIN_LNG` - Route origin (default: Nasca)
//! - `WHATSAPP_NUMBER` - Checkout destination number (default: 918647161)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use mercadito_core::Coordinates;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// Neighborhoods the delivery service covers, with their pickup landmarks.
pub const SERVICE_LOCATIONS: &[(&str, &str)] = &[
    ("Nasca", "Av. Principal #123"),
    ("Vista Alegre", "Calle Las Flores #456"),
    ("Cajuca", "Jr. Los Pinos #789"),
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
    /// Catalog backend configuration
    pub backend: BackendConfig,
    /// Geocoding/routing configuration
    pub geo: GeoConfig,
    /// WhatsApp checkout handoff configuration
    pub whatsapp: WhatsAppConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Catalog backend REST API configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the catalog API, without a trailing slash
    pub base_url: String,
}

/// Geocoding and routing configuration.
///
/// Implements `Debug` manually to redact the provider key.
#[derive(Clone)]
pub struct GeoConfig {
    /// Base URL of the geo endpoints, without a trailing slash
    pub base_url: String,
    /// Mapping provider key, sent with every geo request
    pub api_key: SecretString,
    /// Region bias for address suggestions
    pub region: String,
    /// Route origin latitude (the store's location)
    pub origin_latitude: f64,
    /// Route origin longitude
    pub origin_longitude: f64,
}

impl std::fmt::Debug for GeoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("origin_latitude", &self.origin_latitude)
            .field("origin_longitude", &self.origin_longitude)
            .finish()
    }
}

/// WhatsApp checkout configuration.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// Destination number for order messages, digits only
    pub number: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the provider key fails validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");

        let backend = BackendConfig::from_env()?;
        let geo = GeoConfig::from_env(&backend)?;
        let whatsapp = WhatsAppConfig::from_env();
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            geo,
            whatsapp,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: normalize_base_url(get_required_env("CATALOG_API_URL")?),
        })
    }
}

impl GeoConfig {
    /// The fixed route origin (the store's location).
    #[must_use]
    pub const fn origin(&self) -> Coordinates {
        Coordinates {
            latitude: self.origin_latitude,
            longitude: self.origin_longitude,
        }
    }

    fn from_env(backend: &BackendConfig) -> Result<Self, ConfigError> {
        // The geo endpoints ship with the catalog backend unless pointed
        // elsewhere explicitly.
        let base_url = get_optional_env("GEO_API_URL")
            .map_or_else(|| backend.base_url.clone(), normalize_base_url);

        Ok(Self {
            base_url,
            api_key: get_validated_secret("MAPS_API_KEY")?,
            region: get_env_or_default("SERVICE_REGION", "Nasca, Ica, Perú"),
            origin_latitude: get_f64_or_default("STORE_ORIGIN_LAT", -14.8356)?,
            origin_longitude: get_f64_or_default("STORE_ORIGIN_LNG", -74.9399)?,
        })
    }
}

impl WhatsAppConfig {
    fn from_env() -> Self {
        Self {
            number: get_env_or_default("WHATSAPP_NUMBER", "918647161"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an `f64` environment variable with a default value.
fn get_f64_or_default(key: &str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Strip a trailing slash so endpoint paths can always be appended.
fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
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

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real provider keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the real provider key."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend: BackendConfig {
                base_url: "http://localhost:4000".to_string(),
            },
            geo: GeoConfig {
                base_url: "http://localhost:4000".to_string(),
                api_key: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*"),
                region: "Nasca, Ica, Perú".to_string(),
                origin_latitude: -14.8356,
                origin_longitude: -74.9399,
            },
            whatsapp: WhatsAppConfig {
                number: "918647161".to_string(),
            },
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_normalize_base_url_strips_trailing_slash() {
        assert_eq!(
            normalize_base_url("http://localhost:4000/".to_string()),
            "http://localhost:4000"
        );
        assert_eq!(
            normalize_base_url("http://localhost:4000".to_string()),
            "http://localhost:4000"
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_geo_config_debug_redacts_key() {
        let config = test_config();
        let debug_output = format!("{:?}", config.geo);

        assert!(debug_output.contains("http://localhost:4000"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("aB3$xY9"));
    }

    #[test]
    fn test_service_locations_cover_nasca() {
        assert_eq!(SERVICE_LOCATIONS.len(), 3);
        assert!(SERVICE_LOCATIONS.iter().any(|(name, _)| *name == "Nasca"));
    }
}
