//! # Filter Criteria
//!
//! The typed, sparse filter record the pipeline operates on, plus the
//! one place raw URL query strings are turned into typed values.
//!
//! Normalization is deliberately forgiving: malformed numbers, unknown
//! enum tokens and unknown keys are treated as "no constraint", never as
//! errors. Bad user input degrades, it does not fail a request.

use serde::Deserialize;

use emlak_core::property::{
    DeedStatus, FromWho, Furnishing, Heating, ListingType, MainCategory, PropertyStatus,
    RoomLayout, UsageStatus,
};

/// A sparse set of filter constraints over property records.
///
/// `None` means "no constraint". Boolean flags follow the must-be-true
/// convention: `false` is identical to absent — there is no way to
/// express "must NOT have a balcony". Range bounds are inclusive and
/// independently optional; `0` is a valid bound distinct from absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    // Exact-match constraints.
    pub listing_type: Option<ListingType>,
    pub category: Option<MainCategory>,
    pub status: Option<PropertyStatus>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub rooms: Option<RoomLayout>,
    pub furnishing: Option<Furnishing>,
    pub heating: Option<Heating>,
    pub usage_status: Option<UsageStatus>,
    pub deed_status: Option<DeedStatus>,
    pub from_who: Option<FromWho>,

    // Inclusive range constraints.
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_size: Option<u32>,
    pub max_size: Option<u32>,
    pub min_monthly_fee: Option<u64>,
    pub max_monthly_fee: Option<u64>,

    // Must-be-true flags.
    pub has_car_park: bool,
    pub has_elevator: bool,
    pub has_balcony: bool,
    pub in_site: bool,
    pub is_furnished: bool,
    pub credit_eligible: bool,
    pub exchange_available: bool,

    // Free-text search across title/description/city/district.
    pub search: Option<String>,
}

/// Parse a numeric criterion. Malformed input is absent, not an error.
fn parse_num<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

/// Parse an enum criterion via `FromStr`. Unknown tokens are absent.
fn parse_enum<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

/// A flag criterion is set only by the literal `"true"`.
fn parse_flag(value: &str) -> bool {
    value.trim() == "true"
}

impl FilterCriteria {
    /// Build criteria from raw string key/value pairs (URL query shape).
    ///
    /// Empty values are dropped before parsing; keys this pipeline does
    /// not know (e.g. `sort_by`, `page`, tracking parameters) are
    /// ignored, so the same map that carries pagination can be passed
    /// through unchanged.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut criteria = Self::default();
        for (key, value) in pairs {
            if value.trim().is_empty() {
                continue;
            }
            match key {
                "listing_type" => criteria.listing_type = parse_enum(value),
                "category" => criteria.category = parse_enum(value),
                "status" => criteria.status = parse_enum(value),
                "city" => criteria.city = Some(value.trim().to_string()),
                "district" => criteria.district = Some(value.trim().to_string()),
                "rooms" => criteria.rooms = parse_enum(value),
                "furnishing" => criteria.furnishing = parse_enum(value),
                "heating" => criteria.heating = parse_enum(value),
                "usage_status" => criteria.usage_status = parse_enum(value),
                "deed_status" => criteria.deed_status = parse_enum(value),
                "from_who" => criteria.from_who = parse_enum(value),
                "min_price" => criteria.min_price = parse_num(value),
                "max_price" => criteria.max_price = parse_num(value),
                "min_size" => criteria.min_size = parse_num(value),
                "max_size" => criteria.max_size = parse_num(value),
                "min_monthly_fee" => criteria.min_monthly_fee = parse_num(value),
                "max_monthly_fee" => criteria.max_monthly_fee = parse_num(value),
                "has_car_park" => criteria.has_car_park = parse_flag(value),
                "has_elevator" => criteria.has_elevator = parse_flag(value),
                "has_balcony" => criteria.has_balcony = parse_flag(value),
                "in_site" => criteria.in_site = parse_flag(value),
                "is_furnished" => criteria.is_furnished = parse_flag(value),
                "credit_eligible" => criteria.credit_eligible = parse_flag(value),
                "exchange_available" => criteria.exchange_available = parse_flag(value),
                "search" => criteria.search = Some(value.trim().to_string()),
                _ => {}
            }
        }
        criteria
    }

    /// Whether this criteria set constrains anything at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Return a copy with `status` set if it was absent.
    ///
    /// Used by the public listing route to default to active listings
    /// while leaving the pipeline itself constraint-neutral.
    pub fn with_default_status(mut self, status: PropertyStatus) -> Self {
        if self.status.is_none() {
            self.status = Some(status);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(v: &[(&'static str, &'static str)]) -> FilterCriteria {
        FilterCriteria::from_query_pairs(v.iter().copied())
    }

    #[test]
    fn empty_input_yields_empty_criteria() {
        let criteria = pairs(&[]);
        assert!(criteria.is_empty());
    }

    #[test]
    fn parses_typed_fields() {
        let criteria = pairs(&[
            ("listing_type", "rent"),
            ("city", "İstanbul"),
            ("rooms", "2+1"),
            ("min_price", "1000"),
            ("max_price", "5000"),
        ]);
        assert_eq!(criteria.listing_type, Some(ListingType::Rent));
        assert_eq!(criteria.city.as_deref(), Some("İstanbul"));
        assert_eq!(criteria.rooms, Some(RoomLayout::TwoPlusOne));
        assert_eq!(criteria.min_price, Some(1000));
        assert_eq!(criteria.max_price, Some(5000));
    }

    #[test]
    fn malformed_numbers_become_absent() {
        let criteria = pairs(&[("min_price", "abc"), ("max_size", "12.5x")]);
        assert!(criteria.min_price.is_none());
        assert!(criteria.max_size.is_none());
        assert!(criteria.is_empty());
    }

    #[test]
    fn zero_is_a_valid_bound() {
        let criteria = pairs(&[("min_price", "0")]);
        assert_eq!(criteria.min_price, Some(0));
        assert!(!criteria.is_empty());
    }

    #[test]
    fn empty_values_are_dropped() {
        let criteria = pairs(&[("city", ""), ("min_price", "   ")]);
        assert!(criteria.is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let criteria = pairs(&[("utm_source", "mail"), ("sort_by", "price_asc"), ("page", "3")]);
        assert!(criteria.is_empty());
    }

    #[test]
    fn flag_false_is_identical_to_absent() {
        let explicit = pairs(&[("has_elevator", "false")]);
        let absent = pairs(&[]);
        assert_eq!(explicit, absent);
    }

    #[test]
    fn flag_only_set_by_literal_true() {
        assert!(pairs(&[("has_elevator", "true")]).has_elevator);
        assert!(!pairs(&[("has_elevator", "1")]).has_elevator);
        assert!(!pairs(&[("has_elevator", "yes")]).has_elevator);
    }

    #[test]
    fn unknown_enum_token_becomes_absent() {
        let criteria = pairs(&[("rooms", "9+9"), ("heating", "plasma")]);
        assert!(criteria.rooms.is_none());
        assert!(criteria.heating.is_none());
    }

    #[test]
    fn with_default_status_does_not_override_explicit() {
        let explicit = pairs(&[("status", "sold")]).with_default_status(PropertyStatus::Active);
        assert_eq!(explicit.status, Some(PropertyStatus::Sold));

        let defaulted = pairs(&[]).with_default_status(PropertyStatus::Active);
        assert_eq!(defaulted.status, Some(PropertyStatus::Active));
    }
}
