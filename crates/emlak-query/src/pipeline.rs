//! # Query Pipeline Orchestrator
//!
//! The single entry point that turns raw criteria + sort key + page
//! request into the canonical result envelope.
//!
//! Two realizations, one semantics:
//!
//! - [`query_store`] drives a [`PropertyStore`] (count, then fetch the
//!   ordered window) — the server-side path;
//! - [`query_slice`] filters/sorts/windows an already-fetched array —
//!   the client-side path over a result set held in hand.
//!
//! Given the same record set and criteria both return the same items in
//! the same order and the same totals.

use thiserror::Error;

use emlak_core::property::PropertyRecord;

use crate::criteria::FilterCriteria;
use crate::page::{window, Page, PageRequest, Pagination};
use crate::sort::SortKey;
use crate::store::{filter_and_sort, PropertyStore, StoreError};

/// Failures the pipeline can surface.
///
/// Only infrastructure problems become errors; criteria problems have
/// already been degraded to "no constraint" during normalization.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The backing store could not answer.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A fully-normalized listing query: criteria + sort + page window.
///
/// [`ListingQuery::from_query_pairs`] is the one boundary where raw URL
/// parameters are interpreted; everything downstream is typed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub criteria: FilterCriteria,
    pub sort: SortKey,
    pub page: PageRequest,
}

impl ListingQuery {
    /// Normalize a raw key/value parameter map. Filter keys feed the
    /// criteria; `sort_by`, `page` and `limit` feed ordering and
    /// windowing; unknown keys are ignored.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
    {
        let mut sort_by = None;
        let mut page = None;
        let mut limit = None;
        for (key, value) in pairs.clone() {
            match key {
                "sort_by" => sort_by = Some(value),
                "page" => page = Some(value),
                "limit" => limit = Some(value),
                _ => {}
            }
        }
        Self {
            criteria: FilterCriteria::from_query_pairs(pairs),
            sort: SortKey::from_param(sort_by),
            page: PageRequest::from_params(page, limit),
        }
    }
}

/// Run the pipeline against a store handle.
///
/// Issues one count plus one windowed fetch. The count is taken over the
/// fully-filtered set, so `pagination.total` is independent of the
/// requested window; a page beyond the last yields empty items.
pub async fn query_store<S>(
    store: &S,
    query: &ListingQuery,
) -> Result<Page<PropertyRecord>, QueryError>
where
    S: PropertyStore + ?Sized,
{
    let total = store.count_matching(&query.criteria).await?;
    let pagination = Pagination::compute(total, query.page);
    let items = store
        .find_matching(
            &query.criteria,
            query.sort,
            query.page.offset(),
            query.page.limit(),
        )
        .await?;
    tracing::debug!(
        total,
        page = pagination.page,
        returned = items.len(),
        "property query executed"
    );
    Ok(Page { items, pagination })
}

/// Run the pipeline over an in-memory record set.
///
/// Same semantics as [`query_store`]; used for client-side narrowing of
/// an already-fetched result set, and as the reference implementation in
/// equivalence tests.
pub fn query_slice(records: &[PropertyRecord], query: &ListingQuery) -> Page<PropertyRecord> {
    let ordered = filter_and_sort(records, &query.criteria, query.sort);
    let pagination = Pagination::compute(ordered.len() as u64, query.page);
    let items = window(&ordered, query.page);
    Page { items, pagination }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPropertyStore;
    use crate::testutil::{listing, ListingSeed};
    use emlak_core::property::RoomLayout;

    fn seed_prices(store: &MemoryPropertyStore, prices: &[u64]) -> Vec<PropertyRecord> {
        let mut records = Vec::new();
        for &price in prices {
            let record = listing(ListingSeed {
                price,
                ..Default::default()
            });
            store.insert(record.clone());
            records.push(record);
        }
        records
    }

    #[tokio::test]
    async fn price_range_scenario() {
        // R = prices [100, 250, 250, 400, 900]; min 250, max 400,
        // sorted ascending → [250, 250, 400].
        let store = MemoryPropertyStore::new();
        seed_prices(&store, &[100, 250, 250, 400, 900]);

        let query = ListingQuery::from_query_pairs([
            ("min_price", "250"),
            ("max_price", "400"),
            ("sort_by", "price_asc"),
        ]);
        let page = query_store(&store, &query).await.unwrap();
        let prices: Vec<u64> = page.items.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![250, 250, 400]);
        assert_eq!(page.pagination.total, 3);
    }

    #[tokio::test]
    async fn page_three_of_five_at_limit_two() {
        let store = MemoryPropertyStore::new();
        seed_prices(&store, &[1, 2, 3, 4, 5]);

        let query = ListingQuery::from_query_pairs([
            ("sort_by", "price_asc"),
            ("page", "3"),
            ("limit", "2"),
        ]);
        let page = query_store(&store, &query).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].price, 5);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_prev);
    }

    #[tokio::test]
    async fn no_matches_is_an_empty_page_not_an_error() {
        let store = MemoryPropertyStore::new();
        seed_prices(&store, &[100, 200]);

        let query =
            ListingQuery::from_query_pairs([("city", "İstanbul"), ("rooms", "4+1")]);
        let page = query_store(&store, &query).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.total_pages, 0);
    }

    #[tokio::test]
    async fn store_and_slice_paths_agree() {
        let store = MemoryPropertyStore::new();
        let mut records = seed_prices(&store, &[900, 100, 400, 250, 250, 777]);
        records.push({
            let extra = listing(ListingSeed {
                price: 250,
                rooms: RoomLayout::ThreePlusOne,
                ..Default::default()
            });
            store.insert(extra.clone());
            extra
        });

        for raw in [
            vec![],
            vec![("min_price", "250"), ("max_price", "500")],
            vec![("sort_by", "price_desc"), ("page", "2"), ("limit", "3")],
            vec![("rooms", "2+1"), ("sort_by", "price_asc")],
        ] {
            let query = ListingQuery::from_query_pairs(raw.iter().copied());
            let via_store = query_store(&store, &query).await.unwrap();
            let via_slice = query_slice(&records, &query);
            assert_eq!(via_store.items, via_slice.items, "query: {raw:?}");
            assert_eq!(via_store.pagination, via_slice.pagination, "query: {raw:?}");
        }
    }

    #[test]
    fn empty_criteria_slice_is_identity_modulo_order() {
        let records: Vec<_> = [5u64, 3, 9]
            .into_iter()
            .map(|price| {
                listing(ListingSeed {
                    price,
                    ..Default::default()
                })
            })
            .collect();
        let query = ListingQuery::default();
        let page = query_slice(&records, &query);
        assert_eq!(page.pagination.total, records.len() as u64);
        assert_eq!(page.items.len(), records.len());
    }

    #[test]
    fn adding_a_criterion_never_widens() {
        let records: Vec<_> = [100u64, 250, 400]
            .into_iter()
            .map(|price| {
                listing(ListingSeed {
                    price,
                    ..Default::default()
                })
            })
            .collect();

        let broad = ListingQuery::from_query_pairs([("min_price", "200")]);
        let narrow =
            ListingQuery::from_query_pairs([("min_price", "200"), ("max_price", "300")]);
        let broad_total = query_slice(&records, &broad).pagination.total;
        let narrow_total = query_slice(&records, &narrow).pagination.total;
        assert!(narrow_total <= broad_total);
    }
}
