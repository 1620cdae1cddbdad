//! # Filter Predicates
//!
//! Pure, AND-composed predicates over [`PropertyRecord`]. Each criterion
//! contributes one independent boolean check; a record matches when every
//! present criterion accepts it.
//!
//! Hard contract: no predicate may panic for any well-formed record,
//! however sparse. Constraints over optional nested data (`monthly_fee`,
//! `property_details`) fail closed — a record without the data does not
//! match a criterion over it.

use emlak_core::property::{Furnishing, PropertyRecord};

use crate::criteria::FilterCriteria;

/// Inclusive range check against an always-present value.
fn in_range<T: PartialOrd + Copy>(value: T, min: Option<T>, max: Option<T>) -> bool {
    if let Some(min) = min {
        if value < min {
            return false;
        }
    }
    if let Some(max) = max {
        if value > max {
            return false;
        }
    }
    true
}

/// Inclusive range check against an optional value. A missing value
/// fails any present bound.
fn in_range_opt<T: PartialOrd + Copy>(value: Option<T>, min: Option<T>, max: Option<T>) -> bool {
    match (value, min.is_some() || max.is_some()) {
        (_, false) => true,
        (Some(v), true) => in_range(v, min, max),
        (None, true) => false,
    }
}

/// Case-insensitive substring containment.
fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Free-text search: a record matches when any of title, description,
/// city or district contains the query, case-insensitively.
pub fn matches_search(record: &PropertyRecord, query: &str) -> bool {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    contains_ci(&record.title, &needle)
        || contains_ci(&record.description, &needle)
        || contains_ci(&record.location.city, &needle)
        || record
            .location
            .district
            .as_deref()
            .is_some_and(|d| contains_ci(d, &needle))
}

/// Evaluate the full AND-composition of `criteria` against `record`.
pub fn matches(record: &PropertyRecord, criteria: &FilterCriteria) -> bool {
    // Exact-match constraints. Enum comparisons are exact; city and
    // district compare as written (the free-text path is `search`).
    if let Some(t) = criteria.listing_type {
        if record.listing_type != t {
            return false;
        }
    }
    if let Some(c) = criteria.category {
        if record.category.main != c {
            return false;
        }
    }
    if let Some(s) = criteria.status {
        if record.status != s {
            return false;
        }
    }
    if let Some(city) = &criteria.city {
        if &record.location.city != city {
            return false;
        }
    }
    if let Some(district) = &criteria.district {
        if record.location.district.as_ref() != Some(district) {
            return false;
        }
    }
    if let Some(rooms) = criteria.rooms {
        if record.specs.rooms != rooms {
            return false;
        }
    }
    if let Some(furnishing) = criteria.furnishing {
        if record.specs.furnishing != furnishing {
            return false;
        }
    }
    if let Some(heating) = criteria.heating {
        if record.specs.heating != heating {
            return false;
        }
    }

    // Property-details constraints fail closed when the group is absent.
    let details = record.property_details.as_ref();
    if let Some(usage) = criteria.usage_status {
        if details.and_then(|d| d.usage_status) != Some(usage) {
            return false;
        }
    }
    if let Some(deed) = criteria.deed_status {
        if details.and_then(|d| d.deed_status) != Some(deed) {
            return false;
        }
    }
    if let Some(from_who) = criteria.from_who {
        if details.and_then(|d| d.from_who) != Some(from_who) {
            return false;
        }
    }

    // Range constraints.
    if !in_range(record.price, criteria.min_price, criteria.max_price) {
        return false;
    }
    if !in_range(record.specs.net_size, criteria.min_size, criteria.max_size) {
        return false;
    }
    if !in_range_opt(
        record.monthly_fee,
        criteria.min_monthly_fee,
        criteria.max_monthly_fee,
    ) {
        return false;
    }

    // Must-be-true flags.
    if criteria.has_car_park && !record.building_features.car_park {
        return false;
    }
    if criteria.has_elevator && !record.building_features.elevator {
        return false;
    }
    if criteria.has_balcony && !record.interior_features.balcony {
        return false;
    }
    if criteria.in_site && !record.building_features.in_site {
        return false;
    }
    if criteria.is_furnished && record.specs.furnishing != Furnishing::Furnished {
        return false;
    }
    if criteria.credit_eligible && !details.is_some_and(|d| d.credit_eligible) {
        return false;
    }
    if criteria.exchange_available && !details.is_some_and(|d| d.exchange_available) {
        return false;
    }

    // Free-text search narrows further; it never replaces other filters.
    if let Some(query) = &criteria.search {
        if !matches_search(record, query) {
            return false;
        }
    }

    true
}
