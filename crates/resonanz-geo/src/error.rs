//! Geocoding error types.
//!
//! These never cross the [`Geocoder`](resonanz_core::geocoding::Geocoder)
//! boundary; backends log them and report "not found" instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {message}")]
    Provider { status: String, message: String },

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("backend {backend} requires an API key")]
    MissingApiKey { backend: &'static str },
}

impl GeoError {
    /// Whether the failure was the request timing out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}
