//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Emlak Platform API",
        version = "0.3.2",
        description = "Real-estate listings platform: public property search and the agency back-office (CRM, users, activity audit).",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Properties
        crate::routes::properties::list_properties,
        crate::routes::properties::get_property,
        crate::routes::properties::get_property_by_slug,
        crate::routes::properties::record_view,
        crate::routes::properties::create_property,
        crate::routes::properties::update_property,
        crate::routes::properties::delete_property,
        // Customers
        crate::routes::customers::list_customers,
        crate::routes::customers::create_customer,
        crate::routes::customers::get_customer,
        crate::routes::customers::update_customer,
        crate::routes::customers::delete_customer,
        crate::routes::customers::add_interaction,
        // Users
        crate::routes::users::list_users,
        crate::routes::users::create_user,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
        // Auth
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::session_info,
        // Activity
        crate::routes::activity::list_activity,
        crate::routes::activity::verify_activity,
    ),
    components(schemas(
        // Domain records
        emlak_core::property::PropertyRecord,
        emlak_core::property::Category,
        emlak_core::property::Location,
        emlak_core::property::GeoPoint,
        emlak_core::property::Specs,
        emlak_core::property::InteriorFeatures,
        emlak_core::property::ExteriorFeatures,
        emlak_core::property::BuildingFeatures,
        emlak_core::property::PropertyDetails,
        emlak_core::property::Media,
        emlak_core::property::ListingType,
        emlak_core::property::MainCategory,
        emlak_core::property::PropertyStatus,
        emlak_core::property::RoomLayout,
        emlak_core::property::Heating,
        emlak_core::property::Furnishing,
        emlak_core::property::UsageStatus,
        emlak_core::property::DeedStatus,
        emlak_core::property::FromWho,
        emlak_core::crm::CustomerRecord,
        emlak_core::crm::CustomerType,
        emlak_core::crm::Interaction,
        emlak_core::crm::InteractionKind,
        emlak_core::user::UserRecord,
        emlak_core::user::Role,
        emlak_core::activity::ActivityRecord,
        emlak_core::activity::ChainIntegrity,
        emlak_query::Pagination,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Property DTOs
        crate::routes::properties::CreatePropertyRequest,
        crate::routes::properties::UpdatePropertyRequest,
        crate::routes::properties::ViewCountResponse,
        // Customer DTOs
        crate::routes::customers::CreateCustomerRequest,
        crate::routes::customers::UpdateCustomerRequest,
        crate::routes::customers::AddInteractionRequest,
        // User DTOs
        crate::routes::users::CreateUserRequest,
        crate::routes::users::UpdateUserRequest,
        // Auth DTOs
        crate::routes::auth::LoginRequest,
        crate::routes::auth::LoginResponse,
        crate::routes::auth::SessionUser,
        crate::routes::auth::SessionInfoResponse,
    )),
    tags(
        (name = "properties", description = "Public listing search and admin listing management"),
        (name = "customers", description = "CRM customer tracker"),
        (name = "users", description = "Back-office user management"),
        (name = "auth", description = "Session authentication"),
        (name = "activity", description = "Audit log console"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates_and_lists_core_paths() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_value(&spec).unwrap();
        let paths = json["paths"].as_object().unwrap();
        assert!(paths.contains_key("/v1/properties"));
        assert!(paths.contains_key("/v1/properties/{id}"));
        assert!(paths.contains_key("/v1/auth/login"));
        assert!(paths.contains_key("/v1/activity"));
    }

    #[test]
    fn user_schema_has_no_password_field() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_value(&spec).unwrap();
        let user = &json["components"]["schemas"]["UserRecord"];
        let props = user["properties"].as_object().unwrap();
        assert!(!props.contains_key("password"));
        assert!(!props.contains_key("password_digest"));
    }
}
