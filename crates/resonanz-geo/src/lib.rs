//! Resonanz Geo — address normalization through external geocoding
//! providers.
//!
//! This crate provides:
//! - A monotonic-clock [`RateLimiter`] shared by every backend
//! - The plain-text [`NominatimGeocoder`] and the structured
//!   [`GoogleMapsGeocoder`]
//! - [`AnyGeocoder`], the backend selected from [`GeocoderConfig`]

mod backend;
pub mod config;
pub mod error;
pub mod google;
pub mod nominatim;
pub mod rate_limit;

pub use backend::AnyGeocoder;
pub use config::{GeocoderBackend, GeocoderConfig};
pub use error::GeoError;
pub use google::GoogleMapsGeocoder;
pub use nominatim::NominatimGeocoder;
pub use rate_limit::RateLimiter;
