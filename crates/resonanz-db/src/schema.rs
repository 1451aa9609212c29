//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. Record ids are integers
//! drawn from per-table counters in `_sequence`. Uniqueness is enforced
//! by UNIQUE indexes, which the repositories treat as the source of
//! truth under concurrent writers.
//!
//! An address is unique on `identity_key`, which the repository derives
//! from its [`AddressIdentity`](resonanz_core::models::address::AddressIdentity)
//! policy. A database must be used with one policy for its lifetime.

use surrealdb::{Connection, Surreal};
use tracing::{debug, info};

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "addresses_and_tenants",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Id counters
-- =======================================================================
DEFINE TABLE _sequence SCHEMAFULL;
DEFINE FIELD value ON TABLE _sequence TYPE int;

-- =======================================================================
-- Addresses
-- =======================================================================
DEFINE TABLE address SCHEMAFULL;
DEFINE FIELD identity_key ON TABLE address TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD full_address ON TABLE address TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD lat ON TABLE address TYPE option<float>;
DEFINE FIELD lon ON TABLE address TYPE option<float>;
DEFINE FIELD street_number ON TABLE address TYPE option<string>;
DEFINE FIELD street_name ON TABLE address TYPE option<string>;
DEFINE FIELD neighborhood ON TABLE address TYPE option<string>;
DEFINE FIELD city ON TABLE address TYPE option<string>;
DEFINE FIELD region ON TABLE address TYPE option<string>;
DEFINE FIELD postcode ON TABLE address TYPE option<string>;
DEFINE FIELD country ON TABLE address TYPE option<string>;
DEFINE FIELD block ON TABLE address TYPE option<string>;
DEFINE FIELD entrance ON TABLE address TYPE option<string>;
DEFINE FIELD floor ON TABLE address TYPE option<string>;
DEFINE FIELD apartment_number ON TABLE address TYPE option<string>;
DEFINE FIELD created_at ON TABLE address TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_address_identity ON TABLE address \
    COLUMNS identity_key UNIQUE;
DEFINE INDEX idx_address_full_address ON TABLE address \
    COLUMNS full_address;

-- =======================================================================
-- Tenants (reference an address by id)
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD name ON TABLE tenant TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD name_lower ON TABLE tenant TYPE string;
DEFINE FIELD address_id ON TABLE tenant TYPE int;
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tenant_name_address ON TABLE tenant \
    COLUMNS name_lower, address_id UNIQUE;
DEFINE INDEX idx_tenant_address ON TABLE tenant COLUMNS address_id;
DEFINE INDEX idx_tenant_name ON TABLE tenant COLUMNS name_lower;
";

/// Bring the schema up to the latest version.
///
/// Safe to call on every startup: versions already listed in
/// `_migration` are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("cannot create _migration table: {e}")))?;

    let applied = applied_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();

    if pending.is_empty() {
        debug!(version = applied, "Schema is up to date");
        return Ok(());
    }

    for migration in pending {
        apply(db, migration).await?;
    }
    Ok(())
}

/// Highest recorded migration version, or 0 on a fresh database.
async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<i64, DbError> {
    let mut result = db
        .query("SELECT VALUE version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let versions: Vec<i64> = result.take(0)?;
    Ok(versions.into_iter().next().unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    let Migration { version, name, sql } = *migration;
    info!(version, name, "Applying migration");

    db.query(sql)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("v{version} ({name}): {e}")))?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", version))
        .bind(("name", name))
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("v{version} ({name}) applied but not recorded: {e}")))?;

    info!(version, "Migration applied");
    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
