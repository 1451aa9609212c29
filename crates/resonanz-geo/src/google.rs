//! Google Maps Geocoding API backend.
//!
//! Structured backend: keeps the formatted address, coordinates, and the
//! address components mapped onto [`AddressComponents`].

use reqwest::Client;
use resonanz_core::geocoding::Geocoder;
use resonanz_core::models::address::{AddressComponents, CreateAddress};
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::{GeocoderBackend, GeocoderConfig};
use crate::error::GeoError;
use crate::rate_limit::RateLimiter;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
    geometry: Option<Geometry>,
    #[serde(default)]
    address_components: Vec<Component>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct Component {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

pub struct GoogleMapsGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
    limiter: RateLimiter,
}

impl GoogleMapsGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeoError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GeoError::MissingApiKey {
                backend: GeocoderBackend::GoogleMaps.name(),
            })?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            api_key,
            limiter: RateLimiter::new(config.min_interval()),
        })
    }

    async fn lookup(&self, raw: &str) -> Result<Option<CreateAddress>, GeoError> {
        self.limiter.wait_if_needed().await;

        let response: GeocodeResponse = self
            .client
            .get(format!("{}/maps/api/geocode/json", self.base_url))
            .query(&[("address", raw), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        into_address(response)
    }
}

fn into_address(response: GeocodeResponse) -> Result<Option<CreateAddress>, GeoError> {
    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        _ => {
            return Err(GeoError::Provider {
                status: response.status,
                message: response.error_message.unwrap_or_default(),
            });
        }
    }

    let Some(result) = response.results.into_iter().next() else {
        return Ok(None);
    };
    if result.formatted_address.trim().is_empty() {
        return Err(GeoError::Decode("empty formatted_address".into()));
    }

    let (lat, lon) = match result.geometry {
        Some(geometry) => (Some(geometry.location.lat), Some(geometry.location.lng)),
        None => (None, None),
    };

    Ok(Some(CreateAddress {
        full_address: result.formatted_address,
        lat,
        lon,
        components: components_from(&result.address_components),
    }))
}

/// Long name of the first component carrying any of `types`, trying
/// the types in order.
fn first_of(components: &[Component], types: &[&str]) -> Option<String> {
    types.iter().find_map(|wanted| {
        components
            .iter()
            .find(|c| c.types.iter().any(|t| t == wanted))
            .map(|c| c.long_name.clone())
    })
}

fn components_from(components: &[Component]) -> AddressComponents {
    AddressComponents {
        street_number: first_of(components, &["street_number"]),
        street_name: first_of(components, &["route"]),
        neighborhood: first_of(
            components,
            &["neighborhood", "sublocality", "sublocality_level_1"],
        ),
        city: first_of(components, &["locality", "postal_town"]),
        region: first_of(components, &["administrative_area_level_1"]),
        postcode: first_of(components, &["postal_code"]),
        country: first_of(components, &["country"]),
        block: first_of(components, &["premise"]),
        entrance: first_of(components, &["room"]),
        floor: first_of(components, &["floor"]),
        apartment_number: first_of(components, &["subpremise"]),
    }
}

impl Geocoder for GoogleMapsGeocoder {
    async fn normalize(&self, raw: &str) -> Option<CreateAddress> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        match self.lookup(raw).await {
            Ok(Some(address)) => {
                debug!(raw, full_address = %address.full_address, "Normalized address");
                Some(address)
            }
            Ok(None) => {
                debug!(raw, "No match for address");
                None
            }
            Err(e) => {
                error!(
                    raw,
                    backend = GeocoderBackend::GoogleMaps.name(),
                    timeout = e.is_timeout(),
                    error = %e,
                    "Geocoding request failed"
                );
                None
            }
        }
    }
}
