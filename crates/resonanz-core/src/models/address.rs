//! Address domain model.
//!
//! Addresses are created the first time a normalized address is seen
//! and are immutable afterwards. Tenants reference them by `id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured parts of an address.
///
/// Only populated by backends that return structured results; a
/// plain-text backend leaves every component absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressComponents {
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub block: Option<String>,
    pub entrance: Option<String>,
    pub floor: Option<String>,
    pub apartment_number: Option<String>,
}

impl AddressComponents {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A persisted, normalized address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    /// Canonical address string returned by the geocoder.
    pub full_address: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(flatten)]
    pub components: AddressComponents,
    pub created_at: DateTime<Utc>,
}

/// A normalized address that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAddress {
    pub full_address: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(flatten)]
    pub components: AddressComponents,
}

impl CreateAddress {
    /// Address known only by its canonical string.
    pub fn plain(full_address: impl Into<String>) -> Self {
        Self {
            full_address: full_address.into(),
            lat: None,
            lon: None,
            components: AddressComponents::default(),
        }
    }
}

/// How two addresses are recognised as the same entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressIdentity {
    /// Exact, case-sensitive match on `full_address`.
    #[default]
    FullAddress,
    /// Match on the whole [`AddressComponents`] tuple; an absent
    /// component only matches another absent component.
    Components,
}
