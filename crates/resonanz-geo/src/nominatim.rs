//! OpenStreetMap Nominatim backend.
//!
//! Plain-text backend: only the provider's canonical display string is
//! kept. No coordinates and no structured components are stored.

use reqwest::Client;
use resonanz_core::geocoding::Geocoder;
use resonanz_core::models::address::CreateAddress;
use serde::Deserialize;
use tracing::{debug, error};

use crate::config::{GeocoderBackend, GeocoderConfig};
use crate::error::GeoError;
use crate::rate_limit::RateLimiter;

/// One entry of a `/search?format=jsonv2` response.
#[derive(Debug, Deserialize)]
struct Place {
    display_name: String,
}

pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    limiter: RateLimiter,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().to_string(),
            limiter: RateLimiter::new(config.min_interval()),
        })
    }

    async fn lookup(&self, raw: &str) -> Result<Option<CreateAddress>, GeoError> {
        self.limiter.wait_if_needed().await;

        let places: Vec<Place> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", raw), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(first_match(places))
    }
}

fn first_match(places: Vec<Place>) -> Option<CreateAddress> {
    places
        .into_iter()
        .map(|place| place.display_name.trim().to_string())
        .find(|name| !name.is_empty())
        .map(CreateAddress::plain)
}

impl Geocoder for NominatimGeocoder {
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
                    backend = GeocoderBackend::Nominatim.name(),
                    timeout = e.is_timeout(),
                    error = %e,
                    "Geocoding request failed"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Option<CreateAddress> {
        first_match(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn first_place_becomes_plain_address() {
        let body = r#"[
            {"place_id": 1, "lat": "52.5", "lon": "13.4",
             "display_name": "10, Unter den Linden, Mitte, Berlin, 10117, Deutschland"},
            {"place_id": 2, "display_name": "Unter den Linden, Potsdam, Deutschland"}
        ]"#;
        let address = parse(body).unwrap();
        assert_eq!(
            address.full_address,
            "10, Unter den Linden, Mitte, Berlin, 10117, Deutschland"
        );
        assert_eq!(address.lat, None);
        assert_eq!(address.lon, None);
        assert!(address.components.is_empty());
    }

    #[test]
    fn empty_result_is_no_match() {
        assert_eq!(parse("[]"), None);
    }

    #[tokio::test]
    async fn empty_input_skips_the_provider() {
        let geocoder = NominatimGeocoder::new(&GeocoderConfig {
            base_url: Some("http://127.0.0.1:9".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(geocoder.normalize("   ").await, None);
    }

    #[tokio::test]
    async fn unreachable_provider_is_no_match() {
        let geocoder = NominatimGeocoder::new(&GeocoderConfig {
            base_url: Some("http://127.0.0.1:9".into()),
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(geocoder.normalize("1 Main Street").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_lookups_respect_the_interval() {
        let interval = std::time::Duration::from_millis(1000);
        let geocoder = NominatimGeocoder::new(&GeocoderConfig {
            base_url: Some("http://127.0.0.1:9".into()),
            min_interval_ms: Some(1000),
            ..Default::default()
        })
        .unwrap();

        let start = tokio::time::Instant::now();
        for n in 0..5 {
            assert_eq!(geocoder.normalize(&format!("{n} Main Street")).await, None);
        }
        assert!(
            start.elapsed() >= interval * 4,
            "5 lookups finished after {:?}",
            start.elapsed()
        );
    }
}
