//! Resonanz Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - [`AddressRepository`](resonanz_core::repository::AddressRepository)
//!   and [`TenantRepository`](resonanz_core::repository::TenantRepository)
//!   implementations in [`repository`]

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbEngine, DbManager};
pub use error::DbError;
pub use schema::{run_migrations, schema_v1};
