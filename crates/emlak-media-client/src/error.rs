//! Media CDN client errors.

use thiserror::Error;

/// Failures talking to the image CDN.
///
/// Every variant carries the endpoint that failed so operators can tell
/// which CDN operation broke without enabling request-level tracing.
#[derive(Debug, Error)]
pub enum MediaCdnError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("CDN request to {endpoint} failed: {source}")]
    Http {
        /// The logical endpoint, e.g. `"delete_image"`.
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The CDN answered with a non-success status.
    #[error("CDN {endpoint} returned {status}: {message}")]
    Api {
        endpoint: &'static str,
        status: u16,
        /// Response body, truncated for logging.
        message: String,
    },

    /// Configuration problem detected at client construction.
    #[error("CDN configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
