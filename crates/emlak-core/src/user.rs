//! # Back-Office Users
//!
//! User records for the admin console, with role-based access and salted
//! password digests.
//!
//! ## Password storage
//!
//! Passwords are stored as `sha256(salt || password)` with a per-user
//! random 16-byte salt, hex-encoded as `"{salt}${digest}"`. Verification
//! is constant-time over the digest. The digest never appears in API
//! responses — [`UserRecord`] keeps it out of its `Serialize` impl
//! entirely so it cannot leak through a forgotten DTO.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use utoipa::ToSchema;

use crate::error::ValidationError;
use crate::identity::UserId;

/// Roles in the back office, ordered by privilege level.
///
/// The `Ord` derivation respects variant declaration order:
/// `Agent < Admin`. This enables `>=` comparison for role checks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Can manage listings and customers.
    Agent,
    /// Full access, including user management and the activity log.
    Admin,
}

impl Role {
    /// Return the string representation of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            other => Err(ValidationError::UnknownVariant {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Hex-encode a byte slice.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decode a hex string into bytes. Returns `None` on malformed input.
fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// A salted SHA-256 password digest in `"{salt_hex}${digest_hex}"` form.
///
/// Not `Serialize` — the digest travels only through the store layer,
/// never through API response types.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Derive a digest for a new password with a fresh random salt.
    pub fn derive(password: &str) -> Self {
        let mut salt = [0u8; 16];
        OsRng.fill_bytes(&mut salt);
        Self::derive_with_salt(password, &salt)
    }

    fn derive_with_salt(password: &str, salt: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        let digest = hasher.finalize();
        Self(format!("{}${}", hex_encode(salt), hex_encode(&digest)))
    }

    /// Verify a candidate password against this digest in constant time.
    ///
    /// A malformed stored digest verifies as `false` rather than erroring:
    /// the account becomes unloginable, which is the safe failure mode.
    pub fn verify(&self, password: &str) -> bool {
        let Some((salt_hex, digest_hex)) = self.0.split_once('$') else {
            return false;
        };
        let (Some(salt), Some(expected)) = (hex_decode(salt_hex), hex_decode(digest_hex)) else {
            return false;
        };
        let mut hasher = Sha256::new();
        hasher.update(&salt);
        hasher.update(password.as_bytes());
        let actual = hasher.finalize();
        actual.as_slice().ct_eq(expected.as_slice()).into()
    }

    /// The stored string form, for the persistence layer only.
    pub fn as_stored(&self) -> &str {
        &self.0
    }

    /// Reconstruct from the stored string form.
    pub fn from_stored(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

/// A back-office user.
///
/// `password` is deliberately excluded from serialization; the Postgres
/// adapter reads it via [`PasswordDigest::as_stored`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip)]
    pub password: PasswordDigest,
    /// Deactivated users keep their history but cannot log in.
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for PasswordDigest {
    fn default() -> Self {
        // An empty stored form verifies no password.
        Self(String::new())
    }
}
