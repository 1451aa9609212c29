//! Backend selection.

use resonanz_core::geocoding::Geocoder;
use resonanz_core::models::address::CreateAddress;
use tracing::info;

use crate::config::{GeocoderBackend, GeocoderConfig};
use crate::error::GeoError;
use crate::google::GoogleMapsGeocoder;
use crate::nominatim::NominatimGeocoder;

/// The geocoding backend chosen by configuration at startup.
pub enum AnyGeocoder {
    Nominatim(NominatimGeocoder),
    GoogleMaps(GoogleMapsGeocoder),
}

impl AnyGeocoder {
    pub fn from_config(config: &GeocoderConfig) -> Result<Self, GeoError> {
        info!(
            backend = config.backend.name(),
            interval_ms = config.min_interval().as_millis() as u64,
            timeout_secs = config.timeout_secs,
            "Initializing geocoder"
        );

        Ok(match config.backend {
            GeocoderBackend::Nominatim => Self::Nominatim(NominatimGeocoder::new(config)?),
            GeocoderBackend::GoogleMaps => Self::GoogleMaps(GoogleMapsGeocoder::new(config)?),
        })
    }

    pub fn backend(&self) -> GeocoderBackend {
        match self {
            Self::Nominatim(_) => GeocoderBackend::Nominatim,
            Self::GoogleMaps(_) => GeocoderBackend::GoogleMaps,
        }
    }
}

impl Geocoder for AnyGeocoder {
    async fn normalize(&self, raw: &str) -> Option<CreateAddress> {
        match self {
            Self::Nominatim(geocoder) => geocoder.normalize(raw).await,
            Self::GoogleMaps(geocoder) => geocoder.normalize(raw).await,
        }
    }
}
