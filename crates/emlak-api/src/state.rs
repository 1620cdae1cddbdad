//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! Reads are served from in-memory stores; when a Postgres pool is
//! configured the stores hydrate from the database at startup and every
//! mutation writes through. Running without `DATABASE_URL` gives a fully
//! functional in-memory instance, which is also what the test suite uses.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use sqlx::PgPool;

use emlak_core::activity::{verify_chain, ChainIntegrity, GENESIS_HASH};
use emlak_core::{ActivityRecord, CustomerId, CustomerRecord, UserId, UserRecord};
use emlak_media_client::MediaClient;
use emlak_query::MemoryPropertyStore;

use crate::bootstrap::SiteContext;
use crate::session::SessionStore;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// All operations are synchronous (the RwLock is `parking_lot`, not
/// `tokio::sync`) because the lock is never held across `.await` points.
/// `parking_lot::RwLock` is non-poisonable — a panicking writer does not
/// permanently corrupt the store.
#[derive(Debug)]
pub struct Store<K, V> {
    data: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Store<K, V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.data.write().insert(key, value)
    }

    /// Retrieve a record by key.
    pub fn get(&self, key: &K) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    /// List all records, in no particular order.
    pub fn list(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }

    /// Find the first record matching a predicate.
    pub fn find(&self, mut predicate: impl FnMut(&V) -> bool) -> Option<V> {
        self.data.read().values().find(|v| predicate(v)).cloned()
    }

    /// Update a record in place. Returns the updated record, or `None`
    /// if not found.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut V)) -> Option<V> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(key) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Remove a record by key.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.data.write().remove(key)
    }

    /// Check if a record exists.
    pub fn contains(&self, key: &K) -> bool {
        self.data.read().contains_key(key)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -- Activity Log -------------------------------------------------------------

/// In-memory, append-only activity log with hash chaining.
///
/// Appends run under a single write lock so concurrent mutations chain
/// linearly; the chain head is always the last element's hash.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    events: Arc<RwLock<Vec<ActivityRecord>>>,
}

impl ActivityLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event chained onto the current head.
    pub fn append(
        &self,
        actor: impl Into<String>,
        action: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
        metadata: serde_json::Value,
    ) -> ActivityRecord {
        let mut guard = self.events.write();
        let previous = guard
            .last()
            .map(|e| e.event_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let record = ActivityRecord::chained(
            actor,
            action,
            resource_type,
            resource_id,
            metadata,
            previous,
        );
        guard.push(record.clone());
        record
    }

    /// Snapshot all events in append order.
    pub fn list(&self) -> Vec<ActivityRecord> {
        self.events.read().clone()
    }

    /// Verify chain integrity over the full log.
    pub fn verify(&self) -> ChainIntegrity {
        verify_chain(&self.events.read())
    }

    /// Replace log contents from persisted events (startup hydration).
    /// Events must already be in append order.
    pub fn hydrate(&self, events: Vec<ActivityRecord>) {
        *self.events.write() = events;
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// -- Application State --------------------------------------------------------

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Session lifetime in seconds for a normal login.
    pub session_ttl_secs: i64,
    /// Session lifetime in seconds for a "remember me" login.
    pub remember_ttl_secs: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            session_ttl_secs: 3_600,
            remember_ttl_secs: 30 * 24 * 3_600,
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for absent or malformed values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            session_ttl_secs: std::env::var("AUTH_SESSION_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.session_ttl_secs),
            remember_ttl_secs: std::env::var("AUTH_REMEMBER_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.remember_ttl_secs),
        }
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly via `Arc` internals in each store.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Property listings — in-memory store implementing the query
    /// pipeline's `PropertyStore` contract.
    pub properties: MemoryPropertyStore,
    /// CRM customers.
    pub customers: Store<CustomerId, CustomerRecord>,
    /// Back-office users.
    pub users: Store<UserId, UserRecord>,
    /// Tamper-evident audit log.
    pub activity: ActivityLog,
    /// Server-side sessions.
    pub sessions: SessionStore,

    /// PostgreSQL connection pool for durable persistence. When `None`,
    /// the API operates in in-memory-only mode.
    pub db_pool: Option<PgPool>,

    /// Image CDN client for media deletion cascade. When `None`, hard
    /// deletes skip the cascade (logged).
    pub media_client: Option<MediaClient>,

    /// Site context, if bootstrapped from a site manifest.
    pub site: Option<SiteContext>,

    pub config: AppConfig,
}

impl AppState {
    /// Create application state with default configuration, no database
    /// and no CDN client.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None, None)
    }

    /// Create application state with the given configuration and optional
    /// collaborators.
    pub fn with_config(
        config: AppConfig,
        media_client: Option<MediaClient>,
        db_pool: Option<PgPool>,
    ) -> Self {
        Self {
            properties: MemoryPropertyStore::new(),
            customers: Store::new(),
            users: Store::new(),
            activity: ActivityLog::new(),
            sessions: SessionStore::new(),
            db_pool,
            media_client,
            site: None,
            config,
        }
    }

    /// Hydrate in-memory stores from the database.
    ///
    /// Called once on startup when a pool is available. Loads persisted
    /// listings, customers, users and activity events so reads stay fast
    /// and synchronous.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let properties = crate::db::properties::load_all(pool)
            .await
            .map_err(|e| format!("failed to load properties: {e}"))?;
        let property_count = properties.len();
        for record in properties {
            self.properties.insert(record);
        }

        let customers = crate::db::customers::load_all(pool)
            .await
            .map_err(|e| format!("failed to load customers: {e}"))?;
        let customer_count = customers.len();
        for record in customers {
            self.customers.insert(record.id, record);
        }

        let users = crate::db::users::load_all(pool)
            .await
            .map_err(|e| format!("failed to load users: {e}"))?;
        let user_count = users.len();
        for record in users {
            self.users.insert(record.id, record);
        }

        let events = crate::db::activity::load_all(pool)
            .await
            .map_err(|e| format!("failed to load activity log: {e}"))?;
        let event_count = events.len();
        self.activity.hydrate(events);

        tracing::info!(
            properties = property_count,
            customers = customer_count,
            users = user_count,
            activity_events = event_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
