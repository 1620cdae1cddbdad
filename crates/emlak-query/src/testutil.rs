//! Test fixture builders shared by the unit test modules.

use chrono::{DateTime, TimeZone, Utc};
use emlak_core::property::{
    BuildingFeatures, Category, DeedStatus, ExteriorFeatures, FromWho, Furnishing, Heating,
    InteriorFeatures, ListingType, Location, MainCategory, Media, PropertyDetails, PropertyRecord,
    PropertyStatus, RoomLayout, Specs, UsageStatus,
};
use emlak_core::PropertyId;

/// Knobs for building a test listing. Everything not set gets a sane
/// Kadıköy-apartment default.
pub struct ListingSeed {
    pub title: &'static str,
    pub description: &'static str,
    pub listing_type: ListingType,
    pub category: MainCategory,
    pub price: u64,
    pub monthly_fee: Option<u64>,
    pub city: &'static str,
    pub district: Option<&'static str>,
    pub net_size: u32,
    pub rooms: RoomLayout,
    pub furnishing: Furnishing,
    pub status: PropertyStatus,
    pub created_at: DateTime<Utc>,
}

impl Default for ListingSeed {
    fn default() -> Self {
        Self {
            title: "Modern Daire",
            description: "Merkezi konumda daire",
            listing_type: ListingType::Sale,
            category: MainCategory::Residential,
            price: 1_000_000,
            monthly_fee: Some(400),
            city: "İstanbul",
            district: Some("Kadıköy"),
            net_size: 95,
            rooms: RoomLayout::TwoPlusOne,
            furnishing: Furnishing::Unfurnished,
            status: PropertyStatus::Active,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        }
    }
}

/// Build a full [`PropertyRecord`] from a seed.
pub fn listing(seed: ListingSeed) -> PropertyRecord {
    let id = PropertyId::new();
    PropertyRecord {
        id,
        slug: emlak_core::property::make_slug(seed.title, &id),
        title: seed.title.to_string(),
        description: seed.description.to_string(),
        listing_type: seed.listing_type,
        category: Category {
            main: seed.category,
            sub: None,
        },
        price: seed.price,
        monthly_fee: seed.monthly_fee,
        location: Location {
            country: "TR".to_string(),
            state: None,
            city: seed.city.to_string(),
            district: seed.district.map(str::to_string),
            neighborhood: None,
            address: None,
            coordinates: None,
        },
        specs: Specs {
            net_size: seed.net_size,
            gross_size: None,
            rooms: seed.rooms,
            bathrooms: 1,
            age: 5,
            floor: Some(2),
            total_floors: Some(6),
            heating: Heating::NaturalGas,
            furnishing: seed.furnishing,
            balcony_count: Some(1),
        },
        interior_features: InteriorFeatures {
            balcony: true,
            ..Default::default()
        },
        exterior_features: ExteriorFeatures::default(),
        building_features: BuildingFeatures {
            elevator: true,
            car_park: true,
            ..Default::default()
        },
        property_details: Some(PropertyDetails {
            usage_status: Some(UsageStatus::Empty),
            deed_status: Some(DeedStatus::CondominiumOwnership),
            from_who: Some(FromWho::Agency),
            credit_eligible: true,
            exchange_available: false,
        }),
        media: Media::default(),
        status: seed.status,
        view_count: 0,
        created_at: seed.created_at,
        updated_at: seed.created_at,
    }
}
