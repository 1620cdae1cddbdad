//! # CRM Records
//!
//! Customer and interaction records for the back-office tracker. A
//! customer accumulates interactions over time; the list is embedded on
//! the record rather than stored separately because interaction volume
//! per customer is small and they are always read together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::identity::{CustomerId, UserId};

/// What side of the market a customer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    Buyer,
    Seller,
    Tenant,
    Landlord,
}

impl CustomerType {
    /// Return the serialized token for this customer type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::Tenant => "tenant",
            Self::Landlord => "landlord",
        }
    }
}

impl std::fmt::Display for CustomerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CustomerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            "tenant" => Ok(Self::Tenant),
            "landlord" => Ok(Self::Landlord),
            other => Err(ValidationError::UnknownVariant {
                field: "customer_type",
                value: other.to_string(),
            }),
        }
    }
}

/// How an interaction with a customer happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Call,
    Meeting,
    Email,
    SiteVisit,
}

impl InteractionKind {
    /// Return the serialized token for this interaction kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Meeting => "meeting",
            Self::Email => "email",
            Self::SiteVisit => "site_visit",
        }
    }
}

/// One logged touchpoint with a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Interaction {
    pub id: Uuid,
    pub kind: InteractionKind,
    pub note: String,
    /// Agent who had the interaction, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// A CRM customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub full_name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub customer_type: CustomerType,
    #[serde(default)]
    pub note: String,
    /// Agent this customer is assigned to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent: Option<UserId>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_type_round_trips() {
        for t in [
            CustomerType::Buyer,
            CustomerType::Seller,
            CustomerType::Tenant,
            CustomerType::Landlord,
        ] {
            assert_eq!(t.as_str().parse::<CustomerType>().unwrap(), t);
        }
    }

    #[test]
    fn customer_without_interactions_deserializes() {
        let json = serde_json::json!({
            "id": Uuid::new_v4().to_string(),
            "full_name": "Ayşe Yılmaz",
            "phone": "+90 532 000 00 00",
            "customer_type": "buyer",
            "created_at": Utc::now(),
            "updated_at": Utc::now()
        });
        let record: CustomerRecord = serde_json::from_value(json).unwrap();
        assert!(record.interactions.is_empty());
        assert!(record.email.is_none());
        assert_eq!(record.note, "");
    }
}
