//! Tenant domain model.
//!
//! A tenant is a person registered at exactly one address. The same
//! name may appear at several addresses, but only once per address
//! (names compared case-insensitively).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i64,
    /// Name as originally entered.
    pub name: String,
    /// The address this tenant lives at.
    pub address_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub address_id: i64,
}

/// Lookup form of a tenant name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
