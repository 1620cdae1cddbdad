//! # emlak-query — Property Query Pipeline
//!
//! Turns user-supplied filter criteria plus a sort key into an ordered,
//! paginated list of property records, with one shared semantics for the
//! store-backed query path and the in-memory array path.
//!
//! ## Pipeline
//!
//! ```text
//! raw params → ListingQuery (normalize) → predicates (AND) → sort →
//! count → window → Page { items, pagination }
//! ```
//!
//! ## Guarantees
//!
//! - Filters only narrow; empty criteria are the identity.
//! - Ordering is total (explicit id tiebreak) and idempotent.
//! - Pages at a fixed limit cover the filtered set exactly once.
//! - Malformed user input degrades to "no constraint", never an error;
//!   only infrastructure failures surface as [`pipeline::QueryError`].

pub mod criteria;
pub mod page;
pub mod pipeline;
pub mod predicate;
pub mod sort;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use criteria::FilterCriteria;
pub use page::{Page, PageRequest, Pagination, DEFAULT_LIMIT, MAX_LIMIT};
pub use pipeline::{query_slice, query_store, ListingQuery, QueryError};
pub use sort::SortKey;
pub use store::{MemoryPropertyStore, PropertyStore, StoreError};
