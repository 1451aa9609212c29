//! SurrealDB implementation of [`TenantRepository`].
//!
//! Names are stored twice: as entered (for display) and lower-cased
//! in `name_lower`, which backs lookups and the uniqueness index.

use chrono::{DateTime, Utc};
use resonanz_core::error::ResonanzResult;
use resonanz_core::models::Persisted;
use resonanz_core::models::tenant::{CreateTenant, Tenant, normalize_name};
use resonanz_core::repository::TenantRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, error, info};

use super::{MAX_ATTEMPTS, next_id};
use crate::error::DbError;

/// DB-side row struct for queries where the id is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    address_id: i64,
    created_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self, id: i64) -> Tenant {
        Tenant {
            id,
            name: self.name,
            address_id: self.address_id,
            created_at: self.created_at,
        }
    }
}

/// DB-side row struct that includes the record id via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: i64,
    name: String,
    address_id: i64,
    created_at: DateTime<Utc>,
}

impl From<TenantRowWithId> for Tenant {
    fn from(row: TenantRowWithId) -> Self {
        Tenant {
            id: row.record_id,
            name: row.name,
            address_id: row.address_id,
            created_at: row.created_at,
        }
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn address_exists(&self, address_id: i64) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query("SELECT VALUE meta::id(id) FROM type::record('address', $id)")
            .bind(("id", address_id))
            .await?;

        let ids: Vec<i64> = result.take(0)?;
        Ok(!ids.is_empty())
    }

    async fn lookup(&self, name_lower: &str, address_id: i64) -> Result<Option<Tenant>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE name_lower = $name_lower AND address_id = $address_id",
            )
            .bind(("name_lower", name_lower.to_string()))
            .bind(("address_id", address_id))
            .await?;

        let rows: Vec<TenantRowWithId> = result.take(0)?;
        Ok(rows.into_iter().next().map(Tenant::from))
    }

    async fn insert(&self, input: &CreateTenant, name_lower: &str) -> Result<Tenant, DbError> {
        let id = next_id(&self.db, "tenant").await?;

        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, name_lower = $name_lower, \
                 address_id = $address_id",
            )
            .bind(("id", id))
            .bind(("name", input.name.clone()))
            .bind(("name_lower", name_lower.to_string()))
            .bind(("address_id", input.address_id))
            .await?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_statement("tenant", e))?;

        let rows: Vec<TenantRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id.to_string(),
        })?;

        Ok(row.into_tenant(id))
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn find_or_create(&self, input: CreateTenant) -> ResonanzResult<Persisted<Tenant>> {
        if !self.address_exists(input.address_id).await? {
            error!(
                name = %input.name,
                address_id = input.address_id,
                "Refusing to insert tenant for unknown address"
            );
            return Err(DbError::MissingAddress {
                address_id: input.address_id,
            }
            .into());
        }

        let name_lower = normalize_name(&input.name);

        let mut rejected: Option<String> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            if let Some(existing) = self.lookup(&name_lower, input.address_id).await? {
                debug!(id = existing.id, name = %existing.name, "Tenant already exists");
                return Ok(Persisted::existing(existing));
            }
            if let Some(message) = rejected.take() {
                return Err(DbError::Constraint {
                    entity: "tenant".into(),
                    message,
                }
                .into());
            }

            match self.insert(&input, &name_lower).await {
                Ok(tenant) => {
                    info!(
                        id = tenant.id,
                        name = %tenant.name,
                        address_id = tenant.address_id,
                        "Inserted tenant"
                    );
                    return Ok(Persisted::created(tenant));
                }
                Err(DbError::DuplicateRace { message, .. }) => {
                    debug!(name = %input.name, attempt, %message, "Lost tenant insert race, re-reading");
                    rejected = Some(message);
                }
                Err(DbError::WriteConflict { message, .. }) => {
                    debug!(name = %input.name, attempt, %message, "Tenant write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(DbError::Query(format!(
            "could not settle tenant `{}` at address {} after {MAX_ATTEMPTS} attempts",
            input.name, input.address_id
        ))
        .into())
    }

    async fn list_all(&self) -> ResonanzResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM tenant ORDER BY record_id ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn find_by_address(&self, address_id: i64) -> ResonanzResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE address_id = $address_id ORDER BY record_id ASC",
            )
            .bind(("address_id", address_id))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }

    async fn find_by_name(&self, name: &str) -> ResonanzResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE name_lower = $name_lower ORDER BY record_id ASC",
            )
            .bind(("name_lower", normalize_name(name)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(Tenant::from).collect())
    }
}
