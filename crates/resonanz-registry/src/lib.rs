//! Resonanz Registry — registering tenants at normalized addresses and
//! looking them up in both directions.

pub mod error;
pub mod service;

pub use error::RegistryError;
pub use service::{BatchOutcome, Registration, RegistryService, RowFailure};
