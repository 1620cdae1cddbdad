//! # emlak-media-client — Typed client for the image CDN
//!
//! Listing images live on an external CDN, addressed by public id. This
//! crate is the only path the platform uses to talk to it. The API
//! service calls [`MediaClient::delete_images`] when a listing is hard
//! deleted, so orphaned media does not accumulate.
//!
//! The client is cheap to clone (the underlying `reqwest::Client` is an
//! `Arc` internally) and safe to share across request handlers.

pub mod config;
pub mod error;

pub use config::MediaCdnConfig;
pub use error::MediaCdnError;

use std::time::Duration;

use serde::Deserialize;

/// Typed client for CDN management operations.
#[derive(Debug, Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    base_url: url::Url,
}

/// CDN response body for a delete operation.
#[derive(Debug, Deserialize)]
struct DeleteResponse {
    deleted: bool,
}

impl MediaClient {
    /// Create a client from configuration.
    pub fn new(config: MediaCdnConfig) -> Result<Self, MediaCdnError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = reqwest::header::HeaderValue::from_str(&format!(
            "Bearer {}",
            config.api_key.as_str()
        ))
        .map_err(|_| MediaCdnError::Config(config::ConfigError::MissingApiKey))?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| MediaCdnError::Http {
                endpoint: "client_init",
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Delete one image by public id.
    ///
    /// Deleting an id the CDN no longer knows returns `Ok(false)` — the
    /// cascade treats already-gone media as success.
    pub async fn delete_image(&self, public_id: &str) -> Result<bool, MediaCdnError> {
        let url = self.endpoint_url(&format!("v1/assets/{public_id}"));
        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| MediaCdnError::Http {
                endpoint: "delete_image",
                source: e,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MediaCdnError::Api {
                endpoint: "delete_image",
                status: status.as_u16(),
                message: truncate(&message, 200),
            });
        }

        let body: DeleteResponse =
            response.json().await.map_err(|e| MediaCdnError::Http {
                endpoint: "delete_image",
                source: e,
            })?;
        Ok(body.deleted)
    }

    /// Delete a batch of images, continuing past individual failures.
    ///
    /// Returns the number of images confirmed deleted. Failures are
    /// logged per id; the cascade is best-effort by design (the listing
    /// row is already gone when this runs).
    pub async fn delete_images(&self, public_ids: &[String]) -> usize {
        let mut deleted = 0;
        for public_id in public_ids {
            match self.delete_image(public_id).await {
                Ok(true) => deleted += 1,
                Ok(false) => {
                    tracing::debug!(public_id, "image already absent from CDN");
                }
                Err(e) => {
                    tracing::warn!(public_id, error = %e, "failed to delete CDN image");
                }
            }
        }
        deleted
    }

    /// Probe the CDN management API.
    pub async fn health_check(&self) -> Result<(), MediaCdnError> {
        let url = self.endpoint_url("v1/health");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| MediaCdnError::Http {
                endpoint: "health_check",
                source: e,
            })?;
        if !response.status().is_success() {
            return Err(MediaCdnError::Api {
                endpoint: "health_check",
                status: response.status().as_u16(),
                message: String::new(),
            });
        }
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
