//! Property persistence and the SQL realization of the query pipeline.
//!
//! Filterable attributes are first-class columns; the rest of the record
//! travels as JSONB blobs. [`PgPropertyStore`] compiles `FilterCriteria`
//! into WHERE clauses that mirror the in-memory predicates term for term
//! — the two paths must return identical results for the same record
//! set, which is the pipeline's core correctness property.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use emlak_core::property::{
    BuildingFeatures, Category, ExteriorFeatures, InteriorFeatures, ListingType, Location, Media,
    PropertyDetails, PropertyRecord, PropertyStatus, Specs,
};
use emlak_core::PropertyId;
use emlak_query::{FilterCriteria, PropertyStore, SortKey, StoreError};

/// Serialize an enum-valued field to its column token.
///
/// Never silently defaults: a record that cannot be serialized must not
/// be written with a wrong value and revert on restart.
fn enum_token<T: serde::Serialize + std::fmt::Debug>(
    field: &'static str,
    value: &T,
) -> Result<String, sqlx::Error> {
    let json = serde_json::to_value(value).map_err(|e| {
        tracing::error!(error = %e, field, value = ?value, "failed to serialize enum column");
        sqlx::Error::Encode(Box::new(e))
    })?;
    json.as_str().map(String::from).ok_or_else(|| {
        tracing::error!(field, value = ?json, "enum did not serialize to a JSON string");
        sqlx::Error::Encode(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "enum did not serialize to a string",
        )))
    })
}

fn to_jsonb<T: serde::Serialize>(
    field: &'static str,
    value: &T,
) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(value).map_err(|e| {
        tracing::error!(error = %e, field, "failed to serialize JSONB column");
        sqlx::Error::Encode(Box::new(e))
    })
}

/// Insert a new property record.
pub async fn insert(pool: &PgPool, record: &PropertyRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO properties (id, slug, title, description, listing_type, category_main,
         category_sub, price, monthly_fee, city, district, location, net_size, rooms,
         furnishing, heating, specs, interior_features, exterior_features, building_features,
         property_details, media, status, view_count, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
         $18, $19, $20, $21, $22, $23, $24, $25, $26)",
    )
    .bind(record.id.as_uuid())
    .bind(&record.slug)
    .bind(&record.title)
    .bind(&record.description)
    .bind(enum_token("listing_type", &record.listing_type)?)
    .bind(enum_token("category_main", &record.category.main)?)
    .bind(&record.category.sub)
    .bind(record.price as i64)
    .bind(record.monthly_fee.map(|f| f as i64))
    .bind(&record.location.city)
    .bind(&record.location.district)
    .bind(to_jsonb("location", &record.location)?)
    .bind(i64::from(record.specs.net_size))
    .bind(enum_token("rooms", &record.specs.rooms)?)
    .bind(enum_token("furnishing", &record.specs.furnishing)?)
    .bind(enum_token("heating", &record.specs.heating)?)
    .bind(to_jsonb("specs", &record.specs)?)
    .bind(to_jsonb("interior_features", &record.interior_features)?)
    .bind(to_jsonb("exterior_features", &record.exterior_features)?)
    .bind(to_jsonb("building_features", &record.building_features)?)
    .bind(
        record
            .property_details
            .as_ref()
            .map(|d| to_jsonb("property_details", d))
            .transpose()?,
    )
    .bind(to_jsonb("media", &record.media)?)
    .bind(enum_token("status", &record.status)?)
    .bind(record.view_count as i64)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace a property record (write-through after an in-memory update).
pub async fn update(pool: &PgPool, record: &PropertyRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE properties SET slug = $2, title = $3, description = $4, category_main = $5,
         category_sub = $6, price = $7, monthly_fee = $8, city = $9, district = $10,
         location = $11, net_size = $12, rooms = $13, furnishing = $14, heating = $15,
         specs = $16, interior_features = $17, exterior_features = $18,
         building_features = $19, property_details = $20, media = $21, status = $22,
         view_count = $23, updated_at = $24
         WHERE id = $1",
    )
    .bind(record.id.as_uuid())
    .bind(&record.slug)
    .bind(&record.title)
    .bind(&record.description)
    .bind(enum_token("category_main", &record.category.main)?)
    .bind(&record.category.sub)
    .bind(record.price as i64)
    .bind(record.monthly_fee.map(|f| f as i64))
    .bind(&record.location.city)
    .bind(&record.location.district)
    .bind(to_jsonb("location", &record.location)?)
    .bind(i64::from(record.specs.net_size))
    .bind(enum_token("rooms", &record.specs.rooms)?)
    .bind(enum_token("furnishing", &record.specs.furnishing)?)
    .bind(enum_token("heating", &record.specs.heating)?)
    .bind(to_jsonb("specs", &record.specs)?)
    .bind(to_jsonb("interior_features", &record.interior_features)?)
    .bind(to_jsonb("exterior_features", &record.exterior_features)?)
    .bind(to_jsonb("building_features", &record.building_features)?)
    .bind(
        record
            .property_details
            .as_ref()
            .map(|d| to_jsonb("property_details", d))
            .transpose()?,
    )
    .bind(to_jsonb("media", &record.media)?)
    .bind(enum_token("status", &record.status)?)
    .bind(record.view_count as i64)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Hard delete a property row.
pub async fn delete(pool: &PgPool, id: &PropertyId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM properties WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all property records for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<PropertyRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PropertyRow>(
        "SELECT id, slug, title, description, listing_type, category_main, category_sub,
         price, monthly_fee, location, specs, interior_features, exterior_features,
         building_features, property_details, media, status, view_count, created_at, updated_at
         FROM properties ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PropertyRow::into_record).collect())
}

// ---------------------------------------------------------------------------
// Criteria → SQL compilation
// ---------------------------------------------------------------------------

/// Escape LIKE metacharacters so user search text matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Append WHERE terms mirroring the in-memory predicates.
///
/// Each term corresponds one-to-one to a check in
/// `emlak_query::predicate::matches`; keep the two in lockstep when a
/// filter is added.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, criteria: &FilterCriteria) {
    qb.push(" WHERE TRUE");

    if let Some(t) = criteria.listing_type {
        qb.push(" AND listing_type = ").push_bind(t.as_str());
    }
    if let Some(c) = criteria.category {
        qb.push(" AND category_main = ").push_bind(c.as_str());
    }
    if let Some(s) = criteria.status {
        qb.push(" AND status = ").push_bind(s.as_str());
    }
    if let Some(city) = &criteria.city {
        qb.push(" AND city = ").push_bind(city.clone());
    }
    if let Some(district) = &criteria.district {
        qb.push(" AND district = ").push_bind(district.clone());
    }
    if let Some(rooms) = criteria.rooms {
        qb.push(" AND rooms = ").push_bind(rooms.as_str());
    }
    if let Some(furnishing) = criteria.furnishing {
        qb.push(" AND furnishing = ").push_bind(furnishing.as_str());
    }
    if let Some(heating) = criteria.heating {
        qb.push(" AND heating = ").push_bind(heating.as_str());
    }

    if let Some(usage) = criteria.usage_status {
        qb.push(" AND property_details->>'usage_status' = ")
            .push_bind(usage.as_str());
    }
    if let Some(deed) = criteria.deed_status {
        qb.push(" AND property_details->>'deed_status' = ")
            .push_bind(deed.as_str());
    }
    if let Some(from_who) = criteria.from_who {
        qb.push(" AND property_details->>'from_who' = ")
            .push_bind(from_who.as_str());
    }

    if let Some(min) = criteria.min_price {
        qb.push(" AND price >= ").push_bind(min as i64);
    }
    if let Some(max) = criteria.max_price {
        qb.push(" AND price <= ").push_bind(max as i64);
    }
    if let Some(min) = criteria.min_size {
        qb.push(" AND net_size >= ").push_bind(i64::from(min));
    }
    if let Some(max) = criteria.max_size {
        qb.push(" AND net_size <= ").push_bind(i64::from(max));
    }
    if let Some(min) = criteria.min_monthly_fee {
        qb.push(" AND monthly_fee >= ").push_bind(min as i64);
    }
    if let Some(max) = criteria.max_monthly_fee {
        qb.push(" AND monthly_fee <= ").push_bind(max as i64);
    }

    if criteria.has_car_park {
        qb.push(" AND COALESCE((building_features->>'car_park')::boolean, FALSE)");
    }
    if criteria.has_elevator {
        qb.push(" AND COALESCE((building_features->>'elevator')::boolean, FALSE)");
    }
    if criteria.has_balcony {
        qb.push(" AND COALESCE((interior_features->>'balcony')::boolean, FALSE)");
    }
    if criteria.in_site {
        qb.push(" AND COALESCE((building_features->>'in_site')::boolean, FALSE)");
    }
    if criteria.is_furnished {
        qb.push(" AND furnishing = 'furnished'");
    }
    if criteria.credit_eligible {
        qb.push(" AND COALESCE((property_details->>'credit_eligible')::boolean, FALSE)");
    }
    if criteria.exchange_available {
        qb.push(" AND COALESCE((property_details->>'exchange_available')::boolean, FALSE)");
    }

    if let Some(search) = &criteria.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR city ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR COALESCE(district, '') ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// ORDER BY terms for a sort key, always with the id tiebreak the
/// in-memory comparator applies.
fn order_by(sort: SortKey) -> &'static str {
    match sort {
        SortKey::PriceAsc => " ORDER BY price ASC, id ASC",
        SortKey::PriceDesc => " ORDER BY price DESC, id ASC",
        SortKey::SizeDesc => " ORDER BY net_size DESC, id ASC",
        SortKey::Newest => " ORDER BY created_at DESC, id ASC",
    }
}

fn query_failed(operation: &'static str, e: sqlx::Error) -> StoreError {
    tracing::error!(error = %e, operation, "property store query failed");
    StoreError::Query {
        operation,
        message: e.to_string(),
    }
}

/// Postgres-backed realization of the query pipeline's store contract.
#[derive(Debug, Clone)]
pub struct PgPropertyStore {
    pool: PgPool,
}

impl PgPropertyStore {
    /// Wrap a pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PropertyStore for PgPropertyStore {
    async fn count_matching(&self, criteria: &FilterCriteria) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM properties");
        push_filters(&mut qb, criteria);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_failed("count_matching", e))?;
        Ok(count.max(0) as u64)
    }

    async fn find_matching(
        &self,
        criteria: &FilterCriteria,
        sort: SortKey,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<PropertyRecord>, StoreError> {
        let mut qb = QueryBuilder::new(
            "SELECT id, slug, title, description, listing_type, category_main, category_sub,
             price, monthly_fee, location, specs, interior_features, exterior_features,
             building_features, property_details, media, status, view_count, created_at,
             updated_at FROM properties",
        );
        push_filters(&mut qb, criteria);
        qb.push(order_by(sort));
        qb.push(" LIMIT ").push_bind(i64::from(limit));
        qb.push(" OFFSET ").push_bind(skip.min(i64::MAX as u64) as i64);

        let rows: Vec<PropertyRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_failed("find_matching", e))?;
        Ok(rows.into_iter().map(PropertyRow::into_record).collect())
    }

    async fn fetch(&self, id: &PropertyId) -> Result<Option<PropertyRecord>, StoreError> {
        let row = sqlx::query_as::<_, PropertyRow>(
            "SELECT id, slug, title, description, listing_type, category_main, category_sub,
             price, monthly_fee, location, specs, interior_features, exterior_features,
             building_features, property_details, media, status, view_count, created_at,
             updated_at FROM properties WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("fetch", e))?;
        Ok(row.map(PropertyRow::into_record))
    }

    async fn fetch_by_slug(&self, slug: &str) -> Result<Option<PropertyRecord>, StoreError> {
        let row = sqlx::query_as::<_, PropertyRow>(
            "SELECT id, slug, title, description, listing_type, category_main, category_sub,
             price, monthly_fee, location, specs, interior_features, exterior_features,
             building_features, property_details, media, status, view_count, created_at,
             updated_at FROM properties WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_failed("fetch_by_slug", e))?;
        Ok(row.map(PropertyRow::into_record))
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct PropertyRow {
    id: Uuid,
    slug: String,
    title: String,
    description: String,
    listing_type: String,
    category_main: String,
    category_sub: Option<String>,
    price: i64,
    monthly_fee: Option<i64>,
    location: serde_json::Value,
    specs: serde_json::Value,
    interior_features: serde_json::Value,
    exterior_features: serde_json::Value,
    building_features: serde_json::Value,
    property_details: Option<serde_json::Value>,
    media: serde_json::Value,
    status: String,
    view_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Decode an enum column on the read path, logging and defaulting on
/// unknown tokens so one corrupt row cannot abort hydration.
fn decode_enum<T: serde::de::DeserializeOwned>(id: Uuid, field: &'static str, raw: &str, default: T) -> T {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).unwrap_or_else(|e| {
        tracing::error!(
            id = %id,
            field,
            value = raw,
            error = %e,
            "unknown enum token in database — defaulting; investigate possible data corruption"
        );
        default
    })
}

fn decode_jsonb<T: serde::de::DeserializeOwned + Default>(
    id: Uuid,
    field: &'static str,
    value: serde_json::Value,
) -> T {
    serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::error!(
            id = %id,
            field,
            error = %e,
            "failed to deserialize JSONB column — defaulting; investigate possible data corruption"
        );
        T::default()
    })
}

impl PropertyRow {
    fn into_record(self) -> PropertyRecord {
        let id = self.id;
        let listing_type = decode_enum(id, "listing_type", &self.listing_type, ListingType::Sale);
        let category_main = decode_enum(
            id,
            "category_main",
            &self.category_main,
            emlak_core::property::MainCategory::Residential,
        );
        let status = decode_enum(id, "status", &self.status, PropertyStatus::Passive);

        // Specs carry required enums of their own; a corrupt blob falls
        // back to a minimal default rather than aborting hydration.
        let specs: Specs = serde_json::from_value(self.specs).unwrap_or_else(|e| {
            tracing::error!(id = %id, error = %e, "failed to deserialize specs — using placeholder");
            Specs {
                net_size: 0,
                gross_size: None,
                rooms: emlak_core::property::RoomLayout::Studio,
                bathrooms: 0,
                age: 0,
                floor: None,
                total_floors: None,
                heating: emlak_core::property::Heating::None,
                furnishing: emlak_core::property::Furnishing::Unfurnished,
                balcony_count: None,
            }
        });

        let location: Location = serde_json::from_value(self.location).unwrap_or_else(|e| {
            tracing::error!(id = %id, error = %e, "failed to deserialize location — using placeholder");
            Location {
                country: String::new(),
                state: None,
                city: String::new(),
                district: None,
                neighborhood: None,
                address: None,
                coordinates: None,
            }
        });

        PropertyRecord {
            id: PropertyId::from_uuid(id),
            slug: self.slug,
            title: self.title,
            description: self.description,
            listing_type,
            category: Category {
                main: category_main,
                sub: self.category_sub,
            },
            price: self.price.max(0) as u64,
            monthly_fee: self.monthly_fee.map(|f| f.max(0) as u64),
            location,
            specs,
            interior_features: decode_jsonb::<InteriorFeatures>(
                id,
                "interior_features",
                self.interior_features,
            ),
            exterior_features: decode_jsonb::<ExteriorFeatures>(
                id,
                "exterior_features",
                self.exterior_features,
            ),
            building_features: decode_jsonb::<BuildingFeatures>(
                id,
                "building_features",
                self.building_features,
            ),
            property_details: self
                .property_details
                .map(|v| decode_jsonb::<PropertyDetails>(id, "property_details", v)),
            media: decode_jsonb::<Media>(id, "media", self.media),
            status,
            view_count: self.view_count.max(0) as u64,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_neutralizes_metacharacters() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("villa"), "villa");
    }

    #[test]
    fn order_by_always_tiebreaks_on_id() {
        for key in [
            SortKey::PriceAsc,
            SortKey::PriceDesc,
            SortKey::SizeDesc,
            SortKey::Newest,
        ] {
            assert!(order_by(key).contains("id ASC"), "{key:?}");
        }
    }

    #[test]
    fn push_filters_compiles_each_criterion_once() {
        let mut criteria = FilterCriteria::default();
        criteria.listing_type = Some(ListingType::Rent);
        criteria.min_price = Some(0);
        criteria.max_price = Some(5000);
        criteria.has_elevator = true;
        criteria.search = Some("villa".to_string());

        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM properties");
        push_filters(&mut qb, &criteria);
        let sql = qb.into_sql();

        assert_eq!(sql.matches("listing_type =").count(), 1);
        assert_eq!(sql.matches("price >=").count(), 1);
        assert_eq!(sql.matches("price <=").count(), 1);
        assert!(sql.contains("building_features->>'elevator'"));
        assert!(sql.contains("ILIKE"));
    }

    #[test]
    fn empty_criteria_compile_to_no_constraints() {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM properties");
        push_filters(&mut qb, &FilterCriteria::default());
        let sql = qb.into_sql();
        assert!(sql.ends_with("WHERE TRUE"), "{sql}");
    }

    #[test]
    fn flag_false_compiles_like_absent() {
        let mut criteria = FilterCriteria::default();
        criteria.has_car_park = false;
        let mut with_false = QueryBuilder::new("");
        push_filters(&mut with_false, &criteria);
        let mut absent = QueryBuilder::new("");
        push_filters(&mut absent, &FilterCriteria::default());
        assert_eq!(with_false.into_sql(), absent.into_sql());
    }
}
