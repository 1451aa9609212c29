//! Resonanz Core — domain models, error taxonomy, and the traits the
//! storage and geocoding crates implement.

pub mod error;
pub mod geocoding;
pub mod models;
pub mod repository;
