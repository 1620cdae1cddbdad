//! # Session Authentication
//!
//! Explicit server-side session state: opaque bearer tokens mapped to
//! session records, with an expiry check and sliding renewal performed
//! per request — no ambient timers anywhere.
//!
//! ## Token handling
//!
//! Tokens are 32 random bytes, hex-encoded, handed to the client once at
//! login. The store never keeps the plaintext token: sessions are keyed
//! by `sha256(token)`, so a leaked store snapshot cannot be replayed.
//!
//! ## Renewal
//!
//! Every authenticated request pushes `expires_at` forward by the
//! session's TTL (normal or "remember me", fixed at login). An expired
//! session is evicted on first touch and the request gets a 401.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand_core::{OsRng, RngCore};

use emlak_core::activity::sha256_hex;
use emlak_core::{Role, UserId, UserRecord};

use crate::error::{AppError, ErrorBody, ErrorDetail};

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// Identity of the authenticated caller, injected into request
/// extensions by the session middleware and extracted by handlers via
/// `FromRequestParts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl CallerIdentity {
    /// Check if the caller has at least the given minimum role.
    ///
    /// `Role` derives `Ord` with `Agent < Admin`, so this is a single
    /// comparison.
    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }
}

#[axum::async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

/// Check that the caller has at least the required role.
/// Returns 403 Forbidden if the caller's role is insufficient.
pub fn require_role(caller: &CallerIdentity, minimum: Role) -> Result<(), AppError> {
    if caller.has_role(minimum) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "role '{}' required, caller has '{}'",
            minimum.as_str(),
            caller.role.as_str()
        )))
    }
}

// ── Session records ─────────────────────────────────────────────────────────

/// One live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
    /// Whether this session uses the extended "remember me" TTL.
    pub remember: bool,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// TTL policy for sessions, derived from [`crate::state::AppConfig`].
#[derive(Debug, Clone, Copy)]
pub struct SessionTtl {
    pub session: Duration,
    pub remember: Duration,
}

impl SessionTtl {
    /// Build from configured second counts.
    pub fn from_secs(session_ttl_secs: i64, remember_ttl_secs: i64) -> Self {
        Self {
            session: Duration::seconds(session_ttl_secs),
            remember: Duration::seconds(remember_ttl_secs),
        }
    }

    fn for_session(&self, remember: bool) -> Duration {
        if remember {
            self.remember
        } else {
            self.session
        }
    }
}

/// Thread-safe session store keyed by token hash.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    data: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session for a user. Returns the plaintext token (shown to
    /// the client exactly once) and the stored record.
    pub fn create(
        &self,
        user: &UserRecord,
        remember: bool,
        ttl: SessionTtl,
    ) -> (String, SessionRecord) {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();

        let now = Utc::now();
        let record = SessionRecord {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            remember,
            issued_at: now,
            expires_at: now + ttl.for_session(remember),
        };
        self.data.write().insert(sha256_hex(&token), record.clone());
        (token, record)
    }

    /// Authenticate a token: expiry check, then sliding renewal.
    ///
    /// An expired session is removed and `None` is returned. A live
    /// session gets its `expires_at` pushed forward by its TTL.
    pub fn authenticate(&self, token: &str, ttl: SessionTtl) -> Option<CallerIdentity> {
        let key = sha256_hex(token);
        let now = Utc::now();
        let mut guard = self.data.write();

        let Some(record) = guard.get_mut(&key) else {
            return None;
        };
        if record.expires_at <= now {
            guard.remove(&key);
            return None;
        }
        record.expires_at = now + ttl.for_session(record.remember);
        Some(CallerIdentity {
            user_id: record.user_id,
            username: record.username.clone(),
            role: record.role,
        })
    }

    /// Look up a session without renewing it (introspection).
    pub fn peek(&self, token: &str) -> Option<SessionRecord> {
        self.data.read().get(&sha256_hex(token)).cloned()
    }

    /// Revoke a session. Returns `true` if one existed.
    pub fn revoke(&self, token: &str) -> bool {
        self.data.write().remove(&sha256_hex(token)).is_some()
    }

    /// Revoke every session belonging to a user (deactivation, password
    /// change).
    pub fn revoke_user(&self, user_id: &UserId) -> usize {
        let mut guard = self.data.write();
        let before = guard.len();
        guard.retain(|_, record| record.user_id != *user_id);
        before - guard.len()
    }

    /// Number of stored sessions (live and not-yet-evicted expired).
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Middleware ──────────────────────────────────────────────────────────────

/// TTL policy injected into request extensions alongside the store.
#[derive(Debug, Clone, Copy)]
pub struct SessionAuthConfig {
    pub ttl: SessionTtl,
}

fn unauthorized(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            details: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

/// Extract the bearer token from an `Authorization` header value.
fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware guarding the back-office routes.
///
/// Validates the session per request (expiry check + sliding renewal)
/// and injects [`CallerIdentity`] for handlers. Requests without a valid
/// session get a structured 401.
pub async fn session_auth_middleware(mut request: Request, next: Next) -> Response {
    let store = request.extensions().get::<SessionStore>().cloned();
    let config = request.extensions().get::<SessionAuthConfig>().copied();

    let (Some(store), Some(config)) = (store, config) else {
        // Auth layer misconfigured: fail closed.
        tracing::error!("session middleware missing store or config extension");
        return unauthorized("authentication unavailable");
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);

    let Some(token) = token else {
        return unauthorized("missing bearer token");
    };

    match store.authenticate(token, config.ttl) {
        Some(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        None => unauthorized("invalid or expired session"),
    }
}
