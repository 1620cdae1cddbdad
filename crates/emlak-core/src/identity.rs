//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the platform.
//! Each identifier is a distinct type — you cannot pass a [`CustomerId`]
//! where a [`PropertyId`] is expected.
//!
//! All identifiers are UUID-based and therefore always valid by
//! construction.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        #[schema(value_type = String, format = Uuid)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id! {
    /// A unique identifier for a property listing.
    PropertyId
}

uuid_id! {
    /// A unique identifier for a CRM customer.
    CustomerId
}

uuid_id! {
    /// A unique identifier for a back-office user (agent or admin).
    UserId
}

uuid_id! {
    /// A unique identifier for an activity-log event.
    ActivityId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(PropertyId::new(), PropertyId::new());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let id = PropertyId::new();
        let parsed: PropertyId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!("not-a-uuid".parse::<PropertyId>().is_err());
    }

    #[test]
    fn serde_is_transparent() {
        let id = CustomerId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: CustomerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn from_uuid_preserves_value() {
        let raw = Uuid::new_v4();
        let id = UserId::from_uuid(raw);
        assert_eq!(*id.as_uuid(), raw);
    }
}
