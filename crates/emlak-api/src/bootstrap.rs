//! # Site Bootstrap
//!
//! Reads a site manifest at startup and configures the API server for a
//! specific agency deployment.
//!
//! ## Bootstrap Sequence
//!
//! 1. **Load Site Manifest** — Parse YAML, validate required fields.
//! 2. **Seed Admin** — Create the first admin account from environment
//!    variables when the user store is empty.
//! 3. **Log Site Identity** — Structured startup banner.
//!
//! If `SITE_CONFIG` is unset, the server operates in generic mode with
//! no site branding. All other behavior is preserved.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Deserialize;

use emlak_core::{PasswordDigest, Role, UserId, UserRecord};

use crate::state::{AppConfig, AppState};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors during site bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Site manifest file not found at the given path.
    #[error("site manifest not found: {path}")]
    ManifestNotFound { path: String },

    /// Site manifest failed validation.
    #[error("invalid site manifest: {errors:?}")]
    InvalidManifest { errors: Vec<String> },

    /// Site manifest could not be parsed as YAML.
    #[error("malformed site manifest: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// IO error during bootstrap.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// SiteContext — deployment context on AppState
// ---------------------------------------------------------------------------

/// Deployment context loaded during bootstrap.
///
/// When present, responses and logs carry the agency's identity. When
/// absent (generic mode), endpoints use default behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteContext {
    /// Display name of the agency site.
    pub site_name: String,
    /// Public contact email.
    pub contact_email: String,
    /// Public contact phone, if published.
    pub contact_phone: Option<String>,
    /// ISO currency code listings are priced in.
    pub currency: String,
    /// Path the manifest was loaded from.
    pub manifest_path: PathBuf,
}

/// On-disk manifest shape.
#[derive(Debug, Deserialize)]
struct SiteManifest {
    site_name: String,
    contact_email: String,
    #[serde(default)]
    contact_phone: Option<String>,
    #[serde(default)]
    currency: Option<String>,
}

fn load_manifest(path: &Path) -> Result<SiteContext, BootstrapError> {
    if !path.exists() {
        return Err(BootstrapError::ManifestNotFound {
            path: path.display().to_string(),
        });
    }
    let raw = std::fs::read_to_string(path)?;
    let manifest: SiteManifest = serde_yaml::from_str(&raw)?;

    let mut errors = Vec::new();
    if manifest.site_name.trim().is_empty() {
        errors.push("site_name must not be empty".to_string());
    }
    if manifest.contact_email.trim().is_empty() {
        errors.push("contact_email must not be empty".to_string());
    }
    if !errors.is_empty() {
        return Err(BootstrapError::InvalidManifest { errors });
    }

    Ok(SiteContext {
        site_name: manifest.site_name.trim().to_string(),
        contact_email: manifest.contact_email.trim().to_string(),
        contact_phone: manifest.contact_phone,
        currency: manifest.currency.unwrap_or_else(|| "TRY".to_string()),
        manifest_path: path.to_path_buf(),
    })
}

/// Seed the first admin account from `ADMIN_USERNAME`/`ADMIN_PASSWORD`.
///
/// Runs only when the user store is empty (fresh deployment before
/// hydration, or a genuinely empty database). Without the variables the
/// back office stays locked until an operator provisions users directly.
fn seed_admin(state: &AppState) {
    if !state.users.is_empty() {
        return;
    }
    let (Ok(username), Ok(password)) = (
        std::env::var("ADMIN_USERNAME"),
        std::env::var("ADMIN_PASSWORD"),
    ) else {
        tracing::warn!(
            "user store is empty and ADMIN_USERNAME/ADMIN_PASSWORD are unset — \
             back-office login is impossible until a user is provisioned"
        );
        return;
    };

    let now = Utc::now();
    let user = UserRecord {
        id: UserId::new(),
        username: username.clone(),
        display_name: username.clone(),
        email: String::new(),
        role: Role::Admin,
        password: PasswordDigest::derive(&password),
        active: true,
        last_login_at: None,
        created_at: now,
        updated_at: now,
    };
    state.users.insert(user.id, user);
    tracing::info!(username, "seeded bootstrap admin account");
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Bootstrap the application state.
///
/// Reads the site manifest named by `SITE_CONFIG` (when set), attaches
/// the resulting [`SiteContext`], and seeds the bootstrap admin. Returns
/// the enriched AppState ready for `app()`.
pub fn bootstrap(
    config: AppConfig,
    media_client: Option<emlak_media_client::MediaClient>,
    db_pool: Option<sqlx::PgPool>,
) -> Result<AppState, BootstrapError> {
    let mut state = AppState::with_config(config, media_client, db_pool);

    if let Some(path) = std::env::var_os("SITE_CONFIG") {
        let site = load_manifest(Path::new(&path))?;
        tracing::info!(
            site = %site.site_name,
            currency = %site.currency,
            "site manifest loaded"
        );
        state.site = Some(site);
    } else {
        tracing::info!("SITE_CONFIG not set — running in generic mode");
    }

    seed_admin(&state);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn manifest_round_trips() {
        let file = write_manifest(
            "site_name: Bosphorus Estates\ncontact_email: info@bosphorus.example\ncurrency: EUR\n",
        );
        let site = load_manifest(file.path()).unwrap();
        assert_eq!(site.site_name, "Bosphorus Estates");
        assert_eq!(site.currency, "EUR");
        assert!(site.contact_phone.is_none());
    }

    #[test]
    fn currency_defaults_to_try() {
        let file =
            write_manifest("site_name: Emlak Ofisi\ncontact_email: info@emlak.example\n");
        let site = load_manifest(file.path()).unwrap();
        assert_eq!(site.currency, "TRY");
    }

    #[test]
    fn missing_file_is_a_distinct_error() {
        let err = load_manifest(Path::new("/nonexistent/site.yaml")).unwrap_err();
        assert!(matches!(err, BootstrapError::ManifestNotFound { .. }));
    }

    #[test]
    fn empty_site_name_fails_validation() {
        let file = write_manifest("site_name: \"\"\ncontact_email: a@b.c\n");
        let err = load_manifest(file.path()).unwrap_err();
        match err {
            BootstrapError::InvalidManifest { errors } => {
                assert!(errors.iter().any(|e| e.contains("site_name")));
            }
            other => panic!("expected InvalidManifest, got: {other:?}"),
        }
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let file = write_manifest(": not yaml : [");
        let err = load_manifest(file.path()).unwrap_err();
        assert!(matches!(err, BootstrapError::Parse(_)));
    }

    #[test]
    fn seed_admin_skips_populated_store() {
        let state = AppState::new();
        let now = Utc::now();
        let existing = UserRecord {
            id: UserId::new(),
            username: "mevcut".to_string(),
            display_name: "Mevcut".to_string(),
            email: String::new(),
            role: Role::Agent,
            password: PasswordDigest::derive("x"),
            active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(existing.id, existing);
        seed_admin(&state);
        assert_eq!(state.users.len(), 1);
    }
}
