//! Geocoder configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which geocoding provider to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocoderBackend {
    /// OpenStreetMap Nominatim: free, plain-text results, 1 request/s.
    #[default]
    Nominatim,
    /// Google Maps Geocoding API: paid, structured results.
    GoogleMaps,
}

impl GeocoderBackend {
    pub fn name(self) -> &'static str {
        match self {
            Self::Nominatim => "nominatim",
            Self::GoogleMaps => "google_maps",
        }
    }

    /// Minimum spacing between requests allowed by the provider's
    /// published usage policy.
    pub fn default_interval(self) -> Duration {
        match self {
            Self::Nominatim => Duration::from_millis(1000),
            Self::GoogleMaps => Duration::from_millis(200),
        }
    }

    /// Whether results carry lat/lon and address components.
    pub fn is_structured(self) -> bool {
        matches!(self, Self::GoogleMaps)
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Nominatim => "https://nominatim.openstreetmap.org",
            Self::GoogleMaps => "https://maps.googleapis.com",
        }
    }
}

/// Configuration for the geocoding client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub backend: GeocoderBackend,
    /// Provider credential. Required for [`GeocoderBackend::GoogleMaps`].
    pub api_key: Option<String>,
    /// Upper bound for a single provider request (default: 5 seconds).
    pub timeout_secs: u64,
    /// `User-Agent` sent with every request. Nominatim rejects
    /// anonymous clients.
    pub user_agent: String,
    /// Overrides the provider endpoint (e.g. a self-hosted Nominatim).
    pub base_url: Option<String>,
    /// Overrides the backend's default request spacing.
    pub min_interval_ms: Option<u64>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            backend: GeocoderBackend::default(),
            api_key: None,
            timeout_secs: 5,
            user_agent: "resonanz".into(),
            base_url: None,
            min_interval_ms: None,
        }
    }
}

impl GeocoderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.backend.default_interval())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_base_url())
            .trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backends_have_published_intervals() {
        assert_eq!(
            GeocoderBackend::Nominatim.default_interval(),
            Duration::from_millis(1000)
        );
        assert_eq!(
            GeocoderBackend::GoogleMaps.default_interval(),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn interval_override_wins() {
        let config = GeocoderConfig {
            min_interval_ms: Some(50),
            ..Default::default()
        };
        assert_eq!(config.min_interval(), Duration::from_millis(50));
    }

    #[test]
    fn backend_deserializes_from_snake_case() {
        let config: GeocoderConfig =
            serde_json::from_str(r#"{"backend": "google_maps", "api_key": "k"}"#).unwrap();
        assert_eq!(config.backend, GeocoderBackend::GoogleMaps);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.base_url(), "https://maps.googleapis.com");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let config = GeocoderConfig {
            base_url: Some("http://localhost:8080/".into()),
            ..Default::default()
        };
        assert_eq!(config.base_url(), "http://localhost:8080");
    }
}
