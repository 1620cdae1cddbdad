//! Media CDN client configuration.
//!
//! Configures the CDN base URL and credentials. Loaded from environment
//! variables; absence of the API key means the platform runs without a
//! media cascade (the caller decides how to degrade).

use url::Url;
use zeroize::Zeroizing;

/// Configuration for connecting to the image CDN.
///
/// Custom `Debug` implementation redacts the `api_key` field to prevent
/// credential leakage in log output.
#[derive(Clone)]
pub struct MediaCdnConfig {
    /// Base URL of the CDN management API.
    pub base_url: Url,
    /// API key for management operations.
    pub api_key: Zeroizing<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for MediaCdnConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCdnConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl MediaCdnConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `MEDIA_CDN_URL` (default: `https://media.emlak.example`)
    /// - `MEDIA_CDN_API_KEY` (required)
    /// - `MEDIA_CDN_TIMEOUT_SECS` (default: 15)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            std::env::var("MEDIA_CDN_API_KEY").map_err(|_| ConfigError::MissingApiKey)?;
        let raw_url = std::env::var("MEDIA_CDN_URL")
            .unwrap_or_else(|_| "https://media.emlak.example".to_string());
        let base_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidUrl("MEDIA_CDN_URL".to_string(), e.to_string()))?;

        Ok(Self {
            base_url,
            api_key: Zeroizing::new(api_key),
            timeout_secs: std::env::var("MEDIA_CDN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(15),
        })
    }

    /// Configuration pointing at a local mock server (for testing).
    pub fn local_mock(base_url: &str, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl("base_url".to_string(), e.to_string()))?,
            api_key: Zeroizing::new(api_key.to_string()),
            timeout_secs: 5,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("MEDIA_CDN_API_KEY environment variable is required")]
    MissingApiKey,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}
