//! # emlak-core — Domain Model
//!
//! Shared domain types for the Emlak platform: property listings, CRM
//! customers, back-office users, and the tamper-evident activity log.
//!
//! This crate performs no I/O. The query pipeline (`emlak-query`) and the
//! HTTP service (`emlak-api`) both build on these types, which is what
//! lets the store-backed and in-memory query paths share one data shape.

pub mod activity;
pub mod crm;
pub mod error;
pub mod identity;
pub mod property;
pub mod user;

pub use activity::{ActivityRecord, ChainIntegrity, GENESIS_HASH};
pub use crm::{CustomerRecord, CustomerType, Interaction, InteractionKind};
pub use error::ValidationError;
pub use identity::{ActivityId, CustomerId, PropertyId, UserId};
pub use property::{
    BuildingFeatures, Category, DeedStatus, ExteriorFeatures, FromWho, Furnishing, GeoPoint,
    Heating, InteriorFeatures, ListingType, Location, MainCategory, Media, PropertyDetails,
    PropertyRecord, PropertyStatus, RoomLayout, Specs,
};
pub use user::{PasswordDigest, Role, UserRecord};
