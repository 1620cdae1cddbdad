//! # Activity Log
//!
//! Append-only, tamper-evident audit events. Every back-office mutation
//! (listing create/update/delete, customer ops, user ops, logins) appends
//! an event whose SHA-256 hash chains to the previous event.
//!
//! The chain computation lives here so the in-memory log and the Postgres
//! adapter hash identically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use crate::identity::ActivityId;

/// Hash that starts a chain with no predecessor.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// SHA-256 of a string, hex-encoded.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// One audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ActivityRecord {
    pub id: ActivityId,
    /// Username of the actor, or `"system"` for unattended operations.
    pub actor: String,
    /// Verb, e.g. `"create"`, `"update"`, `"delete"`, `"login"`.
    pub action: String,
    /// Resource kind, e.g. `"property"`, `"customer"`, `"user"`.
    pub resource_type: String,
    /// Identifier of the affected resource, as a string.
    pub resource_id: String,
    /// Free-form context for operators (changed fields, failure reasons).
    pub metadata: serde_json::Value,
    /// Hash of the preceding event, or [`GENESIS_HASH`].
    pub previous_hash: String,
    /// Hash of this event, chained over `previous_hash`.
    pub event_hash: String,
    pub created_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Build a new event chained onto `previous_hash`.
    pub fn chained(
        actor: impl Into<String>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        metadata: serde_json::Value,
        previous_hash: impl Into<String>,
    ) -> Self {
        let actor = actor.into();
        let action = action.into();
        let resource_type = resource_type.into();
        let resource_id = resource_id.into();
        let previous_hash = previous_hash.into();
        let event_hash = chain_hash(&previous_hash, &actor, &action, &resource_type, &resource_id);
        Self {
            id: ActivityId::new(),
            actor,
            action,
            resource_type,
            resource_id,
            metadata,
            previous_hash,
            event_hash,
            created_at: Utc::now(),
        }
    }

    /// Recompute this event's hash from its fields.
    pub fn expected_hash(&self) -> String {
        chain_hash(
            &self.previous_hash,
            &self.actor,
            &self.action,
            &self.resource_type,
            &self.resource_id,
        )
    }
}

/// Compute the chain hash for one event.
///
/// Fields are length-prefixed before hashing so that no two distinct
/// field tuples concatenate to the same input.
pub fn chain_hash(
    previous_hash: &str,
    actor: &str,
    action: &str,
    resource_type: &str,
    resource_id: &str,
) -> String {
    let input = format!(
        "{previous_hash}|{}:{actor}|{}:{action}|{}:{resource_type}|{}:{resource_id}",
        actor.len(),
        action.len(),
        resource_type.len(),
        resource_id.len(),
    );
    sha256_hex(&input)
}

/// Result of a chain integrity walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChainIntegrity {
    pub total_events: usize,
    pub broken_links: usize,
    pub chain_valid: bool,
}

/// Walk an ordered event slice and count broken links.
///
/// A link is broken when an event's `previous_hash` does not match its
/// predecessor's `event_hash`, or when its own `event_hash` does not
/// recompute from its fields.
pub fn verify_chain(events: &[ActivityRecord]) -> ChainIntegrity {
    let mut broken_links = 0;
    let mut last_hash: Option<&str> = None;

    for event in events {
        if let Some(expected_prev) = last_hash {
            if event.previous_hash != expected_prev {
                broken_links += 1;
            }
        }
        if event.event_hash != event.expected_hash() {
            broken_links += 1;
        }
        last_hash = Some(&event.event_hash);
    }

    ChainIntegrity {
        total_events: events.len(),
        broken_links,
        chain_valid: broken_links == 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chain_of(n: usize) -> Vec<ActivityRecord> {
        let mut events = Vec::with_capacity(n);
        let mut prev = GENESIS_HASH.to_string();
        for i in 0..n {
            let event = ActivityRecord::chained(
                "ayse",
                "update",
                "property",
                format!("prop-{i}"),
                json!({"seq": i}),
                prev.clone(),
            );
            prev = event.event_hash.clone();
            events.push(event);
        }
        events
    }

    #[test]
    fn empty_chain_is_valid() {
        let result = verify_chain(&[]);
        assert!(result.chain_valid);
        assert_eq!(result.total_events, 0);
    }

    #[test]
    fn well_formed_chain_verifies() {
        let events = chain_of(5);
        let result = verify_chain(&events);
        assert!(result.chain_valid, "{result:?}");
        assert_eq!(result.total_events, 5);
    }

    #[test]
    fn tampered_field_breaks_the_chain() {
        let mut events = chain_of(5);
        events[2].action = "delete".to_string();
        let result = verify_chain(&events);
        assert!(!result.chain_valid);
        assert!(result.broken_links >= 1);
    }

    #[test]
    fn relinked_tail_is_detected() {
        // Drop an event from the middle: the successor's previous_hash
        // no longer matches.
        let mut events = chain_of(5);
        events.remove(2);
        let result = verify_chain(&events);
        assert!(!result.chain_valid);
    }

    #[test]
    fn length_prefix_prevents_field_sliding() {
        // "ab" + "c" and "a" + "bc" must hash differently.
        let h1 = chain_hash(GENESIS_HASH, "ab", "c", "x", "y");
        let h2 = chain_hash(GENESIS_HASH, "a", "bc", "x", "y");
        assert_ne!(h1, h2);
    }

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
