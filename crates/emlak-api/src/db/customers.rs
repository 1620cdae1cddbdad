//! Customer persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `customers` table.
//! Interactions are embedded as JSONB — they are always read and written
//! with their customer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use emlak_core::crm::{CustomerType, Interaction};
use emlak_core::{CustomerId, CustomerRecord, UserId};

fn customer_type_token(value: CustomerType) -> Result<String, sqlx::Error> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(String::from))
        .ok_or_else(|| {
            sqlx::Error::Encode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "customer_type did not serialize to a string",
            )))
        })
}

fn interactions_jsonb(interactions: &[Interaction]) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(interactions).map_err(|e| {
        tracing::error!(error = %e, "failed to serialize customer interactions");
        sqlx::Error::Encode(Box::new(e))
    })
}

/// Insert a new customer record.
pub async fn insert(pool: &PgPool, record: &CustomerRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO customers (id, full_name, phone, email, customer_type, note,
         assigned_agent, interactions, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(record.id.as_uuid())
    .bind(&record.full_name)
    .bind(&record.phone)
    .bind(&record.email)
    .bind(customer_type_token(record.customer_type)?)
    .bind(&record.note)
    .bind(record.assigned_agent.as_ref().map(|a| *a.as_uuid()))
    .bind(interactions_jsonb(&record.interactions)?)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace a customer record (write-through after an in-memory update).
pub async fn update(pool: &PgPool, record: &CustomerRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE customers SET full_name = $2, phone = $3, email = $4, customer_type = $5,
         note = $6, assigned_agent = $7, interactions = $8, updated_at = $9
         WHERE id = $1",
    )
    .bind(record.id.as_uuid())
    .bind(&record.full_name)
    .bind(&record.phone)
    .bind(&record.email)
    .bind(customer_type_token(record.customer_type)?)
    .bind(&record.note)
    .bind(record.assigned_agent.as_ref().map(|a| *a.as_uuid()))
    .bind(interactions_jsonb(&record.interactions)?)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Hard delete a customer row.
pub async fn delete(pool: &PgPool, id: &CustomerId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Load all customers for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<CustomerRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CustomerRow>(
        "SELECT id, full_name, phone, email, customer_type, note, assigned_agent,
         interactions, created_at, updated_at
         FROM customers ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CustomerRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    full_name: String,
    phone: String,
    email: Option<String>,
    customer_type: String,
    note: String,
    assigned_agent: Option<Uuid>,
    interactions: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomerRow {
    fn into_record(self) -> CustomerRecord {
        let customer_type: CustomerType =
            serde_json::from_value(serde_json::Value::String(self.customer_type.clone()))
                .unwrap_or_else(|e| {
                    tracing::error!(
                        id = %self.id,
                        value = %self.customer_type,
                        error = %e,
                        "unknown customer_type in database — defaulting to buyer; \
                         investigate possible data corruption"
                    );
                    CustomerType::Buyer
                });

        let interactions: Vec<Interaction> = serde_json::from_value(self.interactions)
            .unwrap_or_else(|e| {
                tracing::error!(
                    id = %self.id,
                    error = %e,
                    "failed to deserialize customer interactions — defaulting to empty"
                );
                Vec::new()
            });

        CustomerRecord {
            id: CustomerId::from_uuid(self.id),
            full_name: self.full_name,
            phone: self.phone,
            email: self.email,
            customer_type,
            note: self.note,
            assigned_agent: self.assigned_agent.map(UserId::from_uuid),
            interactions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
