//! # Sort Comparator Selection
//!
//! Maps a `sort_by` key to a total order over property records.
//!
//! Every comparator breaks primary-key ties by ascending record id, so
//! ordering is fully deterministic regardless of the underlying sort
//! algorithm — the SQL realization mirrors this with a secondary
//! `ORDER BY id` term.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use emlak_core::property::PropertyRecord;

/// Supported sort orders. Unknown or missing keys fall back to `Newest`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Ascending by price.
    PriceAsc,
    /// Descending by price.
    PriceDesc,
    /// Descending by net size.
    SizeDesc,
    /// Descending by creation time (most recent first). The default.
    #[default]
    Newest,
}

impl SortKey {
    /// Return the serialized token for this sort key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::SizeDesc => "size_desc",
            Self::Newest => "newest",
        }
    }

    /// Resolve a raw `sort_by` parameter. Anything unrecognized — absent,
    /// empty, or a stray value — resolves to [`SortKey::Newest`].
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("size_desc") => Self::SizeDesc,
            _ => Self::Newest,
        }
    }

    /// Compare two records under this key.
    pub fn compare(&self, a: &PropertyRecord, b: &PropertyRecord) -> Ordering {
        let primary = match self {
            Self::PriceAsc => a.price.cmp(&b.price),
            Self::PriceDesc => b.price.cmp(&a.price),
            Self::SizeDesc => b.specs.net_size.cmp(&a.specs.net_size),
            Self::Newest => b.created_at.cmp(&a.created_at),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort records in place under the given key.
pub fn sort_records(records: &mut [PropertyRecord], key: SortKey) {
    records.sort_by(|a, b| key.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{listing, ListingSeed};
    use chrono::{Duration, Utc};

    fn prices(records: &[PropertyRecord]) -> Vec<u64> {
        records.iter().map(|r| r.price).collect()
    }

    #[test]
    fn from_param_falls_back_to_newest() {
        assert_eq!(SortKey::from_param(None), SortKey::Newest);
        assert_eq!(SortKey::from_param(Some("")), SortKey::Newest);
        assert_eq!(SortKey::from_param(Some("cheapest")), SortKey::Newest);
        assert_eq!(SortKey::from_param(Some("price_asc")), SortKey::PriceAsc);
    }

    #[test]
    fn price_asc_orders_ascending_with_duplicates() {
        let mut records: Vec<_> = [900u64, 250, 400, 100, 250]
            .into_iter()
            .map(|price| {
                listing(ListingSeed {
                    price,
                    ..Default::default()
                })
            })
            .collect();
        sort_records(&mut records, SortKey::PriceAsc);
        assert_eq!(prices(&records), vec![100, 250, 250, 400, 900]);
    }

    #[test]
    fn newest_orders_by_created_at_descending() {
        let base = Utc::now();
        let mut records: Vec<_> = (0..4)
            .map(|i| {
                listing(ListingSeed {
                    created_at: base + Duration::minutes(i),
                    price: i as u64,
                    ..Default::default()
                })
            })
            .collect();
        sort_records(&mut records, SortKey::Newest);
        assert_eq!(prices(&records), vec![3, 2, 1, 0]);
    }

    #[test]
    fn equal_keys_tie_break_by_id() {
        let mut records: Vec<_> = (0..6)
            .map(|_| {
                listing(ListingSeed {
                    price: 500,
                    ..Default::default()
                })
            })
            .collect();
        sort_records(&mut records, SortKey::PriceAsc);
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        let mut expected = ids.clone();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut records: Vec<_> = [3u64, 1, 2, 1, 3]
            .into_iter()
            .map(|price| {
                listing(ListingSeed {
                    price,
                    ..Default::default()
                })
            })
            .collect();
        sort_records(&mut records, SortKey::PriceDesc);
        let once = records.clone();
        sort_records(&mut records, SortKey::PriceDesc);
        assert_eq!(once, records);
    }
}
