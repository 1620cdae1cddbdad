//! # Property Listing Domain Model
//!
//! The [`PropertyRecord`] is the canonical shape the whole platform
//! operates over: the public search pipeline filters it, the admin
//! back-office mutates it, and the Postgres adapter persists it.
//!
//! Enum-valued attributes are real enums — a record can never hold a
//! status or room layout outside the domain. Serialized forms use
//! `snake_case` tokens, except [`RoomLayout`] which serializes in its
//! market display form (`"2+1"`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ValidationError;
use crate::identity::PropertyId;

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Whether a listing is offered for sale or for rent.
///
/// Immutable after creation: a sale listing is never reclassified as a
/// rental, it is delisted and recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Sale,
    Rent,
}

impl ListingType {
    /// Return the serialized token for this listing type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Rent => "rent",
        }
    }
}

impl std::fmt::Display for ListingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ListingType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(Self::Sale),
            "rent" => Ok(Self::Rent),
            other => Err(ValidationError::UnknownVariant {
                field: "listing_type",
                value: other.to_string(),
            }),
        }
    }
}

/// Top-level market category of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MainCategory {
    Residential,
    Commercial,
    Land,
    Building,
    Timeshare,
    TouristFacility,
}

impl MainCategory {
    /// Return the serialized token for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial => "commercial",
            Self::Land => "land",
            Self::Building => "building",
            Self::Timeshare => "timeshare",
            Self::TouristFacility => "tourist_facility",
        }
    }
}

impl std::fmt::Display for MainCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MainCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "residential" => Ok(Self::Residential),
            "commercial" => Ok(Self::Commercial),
            "land" => Ok(Self::Land),
            "building" => Ok(Self::Building),
            "timeshare" => Ok(Self::Timeshare),
            "tourist_facility" => Ok(Self::TouristFacility),
            other => Err(ValidationError::UnknownVariant {
                field: "category",
                value: other.to_string(),
            }),
        }
    }
}

/// Category of a listing: a fixed main category plus free-text subcategory
/// (e.g. `residential` / `"Apartment"`, `commercial` / `"Shop"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub main: MainCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

/// Publication status of a listing.
///
/// Only `active` listings appear on the public site by default. `sold`
/// and `rented` are terminal in practice but no transition is enforced —
/// the back-office may correct mistakes freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Active,
    Passive,
    Sold,
    Rented,
}

impl PropertyStatus {
    /// Return the serialized token for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passive => "passive",
            Self::Sold => "sold",
            Self::Rented => "rented",
        }
    }
}

impl std::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PropertyStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "passive" => Ok(Self::Passive),
            "sold" => Ok(Self::Sold),
            "rented" => Ok(Self::Rented),
            other => Err(ValidationError::UnknownVariant {
                field: "status",
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Specs enums
// ---------------------------------------------------------------------------

/// Room layout in Turkish market notation: living rooms are counted after
/// the `+`. Serializes in display form (`"2+1"`), not `snake_case`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum RoomLayout {
    #[serde(rename = "1+0")]
    Studio,
    #[serde(rename = "1+1")]
    OnePlusOne,
    #[serde(rename = "2+1")]
    TwoPlusOne,
    #[serde(rename = "3+1")]
    ThreePlusOne,
    #[serde(rename = "4+1")]
    FourPlusOne,
    #[serde(rename = "5+1")]
    FivePlusOne,
    #[serde(rename = "6+")]
    SixPlusMore,
}

impl RoomLayout {
    /// Return the market display form (`"2+1"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Studio => "1+0",
            Self::OnePlusOne => "1+1",
            Self::TwoPlusOne => "2+1",
            Self::ThreePlusOne => "3+1",
            Self::FourPlusOne => "4+1",
            Self::FivePlusOne => "5+1",
            Self::SixPlusMore => "6+",
        }
    }
}

impl std::fmt::Display for RoomLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoomLayout {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1+0" => Ok(Self::Studio),
            "1+1" => Ok(Self::OnePlusOne),
            "2+1" => Ok(Self::TwoPlusOne),
            "3+1" => Ok(Self::ThreePlusOne),
            "4+1" => Ok(Self::FourPlusOne),
            "5+1" => Ok(Self::FivePlusOne),
            "6+" => Ok(Self::SixPlusMore),
            other => Err(ValidationError::UnknownVariant {
                field: "rooms",
                value: other.to_string(),
            }),
        }
    }
}

/// Heating system of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Heating {
    None,
    Stove,
    NaturalGas,
    Central,
    FloorHeating,
    AirConditioning,
}

impl Heating {
    /// Return the serialized token for this heating type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Stove => "stove",
            Self::NaturalGas => "natural_gas",
            Self::Central => "central",
            Self::FloorHeating => "floor_heating",
            Self::AirConditioning => "air_conditioning",
        }
    }
}

impl std::fmt::Display for Heating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Heating {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "stove" => Ok(Self::Stove),
            "natural_gas" => Ok(Self::NaturalGas),
            "central" => Ok(Self::Central),
            "floor_heating" => Ok(Self::FloorHeating),
            "air_conditioning" => Ok(Self::AirConditioning),
            other => Err(ValidationError::UnknownVariant {
                field: "heating",
                value: other.to_string(),
            }),
        }
    }
}

/// Furnishing state of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Furnishing {
    Furnished,
    Unfurnished,
    PartiallyFurnished,
}

impl Furnishing {
    /// Return the serialized token for this furnishing state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Furnished => "furnished",
            Self::Unfurnished => "unfurnished",
            Self::PartiallyFurnished => "partially_furnished",
        }
    }
}

impl std::fmt::Display for Furnishing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Furnishing {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "furnished" => Ok(Self::Furnished),
            "unfurnished" => Ok(Self::Unfurnished),
            "partially_furnished" => Ok(Self::PartiallyFurnished),
            other => Err(ValidationError::UnknownVariant {
                field: "furnishing",
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Property details enums (deed / usage / seller)
// ---------------------------------------------------------------------------

/// Occupancy state of the property at listing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    Empty,
    TenantOccupied,
    OwnerOccupied,
}

impl UsageStatus {
    /// Return the serialized token for this usage status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::TenantOccupied => "tenant_occupied",
            Self::OwnerOccupied => "owner_occupied",
        }
    }
}

impl std::str::FromStr for UsageStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "empty" => Ok(Self::Empty),
            "tenant_occupied" => Ok(Self::TenantOccupied),
            "owner_occupied" => Ok(Self::OwnerOccupied),
            other => Err(ValidationError::UnknownVariant {
                field: "usage_status",
                value: other.to_string(),
            }),
        }
    }
}

/// Title-deed status of the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeedStatus {
    CondominiumOwnership,
    ConstructionServitude,
    LandTitle,
    SharedTitle,
}

impl DeedStatus {
    /// Return the serialized token for this deed status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CondominiumOwnership => "condominium_ownership",
            Self::ConstructionServitude => "construction_servitude",
            Self::LandTitle => "land_title",
            Self::SharedTitle => "shared_title",
        }
    }
}

impl std::str::FromStr for DeedStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "condominium_ownership" => Ok(Self::CondominiumOwnership),
            "construction_servitude" => Ok(Self::ConstructionServitude),
            "land_title" => Ok(Self::LandTitle),
            "shared_title" => Ok(Self::SharedTitle),
            other => Err(ValidationError::UnknownVariant {
                field: "deed_status",
                value: other.to_string(),
            }),
        }
    }
}

/// Who is offering the property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FromWho {
    Owner,
    Agency,
    Construction,
}

impl FromWho {
    /// Return the serialized token for this seller kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Agency => "agency",
            Self::Construction => "construction",
        }
    }
}

impl std::str::FromStr for FromWho {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "agency" => Ok(Self::Agency),
            "construction" => Ok(Self::Construction),
            other => Err(ValidationError::UnknownVariant {
                field: "from_who",
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Component structs
// ---------------------------------------------------------------------------

/// Geographic point. Validated on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a validated geographic point.
    pub fn new(lat: f64, lon: f64) -> Result<Self, ValidationError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(ValidationError::CoordinateOutOfRange { lat, lon });
        }
        Ok(Self { lat, lon })
    }
}

/// Where a property is. Only `country` and `city` are required; listings
/// for land frequently carry nothing below `district`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

/// Physical specifications of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Specs {
    /// Net interior size in square meters.
    pub net_size: u32,
    /// Gross size including common areas, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_size: Option<u32>,
    pub rooms: RoomLayout,
    pub bathrooms: u8,
    /// Building age in years. `0` means new construction.
    pub age: u8,
    /// Floor the unit is on. Negative values are basement floors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_floors: Option<u16>,
    pub heating: Heating,
    pub furnishing: Furnishing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balcony_count: Option<u8>,
}

/// Interior feature flags. All default to `false` so that partial admin
/// forms and old persisted rows deserialize cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct InteriorFeatures {
    pub alarm: bool,
    pub balcony: bool,
    pub built_in_kitchen: bool,
    pub dressing_room: bool,
    pub air_conditioning: bool,
    pub laminate_flooring: bool,
    pub shower_cabin: bool,
    pub white_goods: bool,
    pub parquet: bool,
    pub jacuzzi: bool,
    pub terrace: bool,
    pub sauna: bool,
    pub laundry_room: bool,
    pub pantry: bool,
    pub video_intercom: bool,
    pub fireplace: bool,
}

/// Exterior feature flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ExteriorFeatures {
    pub pvc_joinery: bool,
    pub aluminum_joinery: bool,
    pub satellite_dish: bool,
    pub thermal_insulation: bool,
    pub double_glazing: bool,
    pub garden: bool,
    pub pool: bool,
    pub tennis_court: bool,
    pub basketball_court: bool,
    pub playground: bool,
    pub generator: bool,
    pub water_well: bool,
}

/// Building-level feature flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BuildingFeatures {
    pub elevator: bool,
    pub car_park: bool,
    pub closed_car_park: bool,
    pub security: bool,
    pub doorman: bool,
    pub fire_escape: bool,
    pub water_tank: bool,
    pub hydrophore: bool,
    pub steel_door: bool,
    /// Whether the property is inside a managed site/complex.
    pub in_site: bool,
    pub earthquake_compliant: bool,
    pub cable_tv: bool,
}

/// Deed, usage and financial details. The whole group is optional on a
/// record; filters over these fields treat an absent group as non-matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PropertyDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_status: Option<UsageStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deed_status: Option<DeedStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_who: Option<FromWho>,
    pub credit_eligible: bool,
    pub exchange_available: bool,
}

/// Media attached to a listing. Images are CDN public ids, resolved to
/// URLs by the frontend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Media {
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_tour_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panoramic_image: Option<String>,
}

// ---------------------------------------------------------------------------
// PropertyRecord
// ---------------------------------------------------------------------------

/// A property listing — the unit filtered, sorted and paginated by the
/// query pipeline.
///
/// `id`, `listing_type` and `created_at` are immutable after creation.
/// `updated_at` is bumped on every mutation. `slug` is derived once from
/// the title and id suffix at creation time and is the public detail-page
/// key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PropertyRecord {
    pub id: PropertyId,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub listing_type: ListingType,
    pub category: Category,
    pub price: u64,
    /// Monthly site dues, where applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_fee: Option<u64>,
    pub location: Location,
    pub specs: Specs,
    #[serde(default)]
    pub interior_features: InteriorFeatures,
    #[serde(default)]
    pub exterior_features: ExteriorFeatures,
    #[serde(default)]
    pub building_features: BuildingFeatures,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_details: Option<PropertyDetails>,
    #[serde(default)]
    pub media: Media,
    pub status: PropertyStatus,
    #[serde(default)]
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Derive a URL slug from a listing title and its id.
///
/// Transliterates Turkish characters, lowercases, collapses runs of
/// non-alphanumerics to single hyphens, and appends the first UUID group
/// of the id so that identically-titled listings get distinct slugs.
pub fn make_slug(title: &str, id: &PropertyId) -> String {
    let mut out = String::with_capacity(title.len() + 9);
    let mut last_was_hyphen = true;
    for c in title.chars() {
        let mapped: Option<char> = match c {
            'ç' | 'Ç' => Some('c'),
            'ğ' | 'Ğ' => Some('g'),
            'ı' | 'İ' => Some('i'),
            'ö' | 'Ö' => Some('o'),
            'ş' | 'Ş' => Some('s'),
            'ü' | 'Ü' => Some('u'),
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
            _ => None,
        };
        match mapped {
            Some(c) => {
                out.push(c);
                last_was_hyphen = false;
            }
            None if !last_was_hyphen => {
                out.push('-');
                last_was_hyphen = true;
            }
            None => {}
        }
    }
    let id_str = id.to_string();
    let suffix = id_str.split('-').next().unwrap_or(&id_str);
    if !out.is_empty() && !out.ends_with('-') {
        out.push('-');
    }
    out.push_str(suffix);
    out
}
