//! # Property Store Contract
//!
//! The read contract the query pipeline runs against, plus the in-memory
//! realization.
//!
//! Two implementations exist: [`MemoryPropertyStore`] here, and the
//! Postgres adapter in the API crate. Both must answer `count_matching`
//! and `find_matching` identically for the same record set and criteria —
//! that equivalence is the pipeline's core correctness property, and the
//! memory store guarantees it by construction by delegating to the same
//! predicate and comparator the in-memory path uses.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use emlak_core::property::PropertyRecord;
use emlak_core::PropertyId;

use crate::criteria::FilterCriteria;
use crate::predicate::matches;
use crate::sort::{sort_records, SortKey};

/// Infrastructure-class store failure.
///
/// Distinct from "nothing matched": an empty result is a successful
/// query, a `StoreError` means the store could not answer at all.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store is unreachable or the connection was lost.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A query failed mid-flight. Carries the failing operation for
    /// operator diagnosis, not the data.
    #[error("store query failed during {operation}: {message}")]
    Query {
        /// The store operation that failed.
        operation: &'static str,
        /// Driver-level failure message.
        message: String,
    },
}

/// Read contract for property queries.
///
/// Implementations translate criteria to their substrate: the memory
/// store applies predicates to records, the Postgres adapter compiles
/// criteria into WHERE clauses. Writes are not part of this contract —
/// the pipeline only reads.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Count records matching the criteria (pre-pagination total).
    async fn count_matching(&self, criteria: &FilterCriteria) -> Result<u64, StoreError>;

    /// Fetch the ordered window `[skip, skip + limit)` of matching records.
    async fn find_matching(
        &self,
        criteria: &FilterCriteria,
        sort: SortKey,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<PropertyRecord>, StoreError>;

    /// Fetch a single record by id. `Ok(None)` means not found.
    async fn fetch(&self, id: &PropertyId) -> Result<Option<PropertyRecord>, StoreError>;

    /// Fetch a single record by slug. `Ok(None)` means not found.
    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<PropertyRecord>, StoreError>;
}

/// Filter and order a record set. Shared by the in-memory array path and
/// [`MemoryPropertyStore`] so the two cannot drift.
pub(crate) fn filter_and_sort(
    records: &[PropertyRecord],
    criteria: &FilterCriteria,
    sort: SortKey,
) -> Vec<PropertyRecord> {
    let mut matched: Vec<PropertyRecord> = records
        .iter()
        .filter(|record| matches(record, criteria))
        .cloned()
        .collect();
    sort_records(&mut matched, sort);
    matched
}

/// Thread-safe, cloneable in-memory property store.
///
/// All synchronous operations use a `parking_lot::RwLock` (never held
/// across `.await` points); the lock is non-poisonable, so a panicking
/// writer does not permanently corrupt the store. Clones share the
/// underlying data.
#[derive(Debug, Default)]
pub struct MemoryPropertyStore {
    data: Arc<RwLock<HashMap<PropertyId, PropertyRecord>>>,
}

impl Clone for MemoryPropertyStore {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl MemoryPropertyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the previous value if the id existed.
    pub fn insert(&self, record: PropertyRecord) -> Option<PropertyRecord> {
        self.data.write().insert(record.id, record)
    }

    /// Retrieve a record by id.
    pub fn get(&self, id: &PropertyId) -> Option<PropertyRecord> {
        self.data.read().get(id).cloned()
    }

    /// Retrieve a record by slug.
    pub fn get_by_slug(&self, slug: &str) -> Option<PropertyRecord> {
        self.data
            .read()
            .values()
            .find(|record| record.slug == slug)
            .cloned()
    }

    /// Update a record in place. Returns the updated record, or `None`
    /// if not found.
    pub fn update(
        &self,
        id: &PropertyId,
        f: impl FnOnce(&mut PropertyRecord),
    ) -> Option<PropertyRecord> {
        let mut guard = self.data.write();
        if let Some(entry) = guard.get_mut(id) {
            f(entry);
            Some(entry.clone())
        } else {
            None
        }
    }

    /// Remove a record by id.
    pub fn remove(&self, id: &PropertyId) -> Option<PropertyRecord> {
        self.data.write().remove(id)
    }

    /// Snapshot all records, in no particular order.
    pub fn list(&self) -> Vec<PropertyRecord> {
        self.data.read().values().cloned().collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PropertyStore for MemoryPropertyStore {
    async fn count_matching(&self, criteria: &FilterCriteria) -> Result<u64, StoreError> {
        let guard = self.data.read();
        Ok(guard
            .values()
            .filter(|record| matches(record, criteria))
            .count() as u64)
    }

    async fn find_matching(
        &self,
        criteria: &FilterCriteria,
        sort: SortKey,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<PropertyRecord>, StoreError> {
        let snapshot = self.list();
        let ordered = filter_and_sort(&snapshot, criteria, sort);
        let start = usize::try_from(skip).unwrap_or(usize::MAX);
        if start >= ordered.len() {
            return Ok(Vec::new());
        }
        let end = start.saturating_add(limit as usize).min(ordered.len());
        Ok(ordered[start..end].to_vec())
    }

    async fn fetch(&self, id: &PropertyId) -> Result<Option<PropertyRecord>, StoreError> {
        Ok(self.get(id))
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<PropertyRecord>, StoreError> {
        Ok(self.get_by_slug(slug))
    }
}
