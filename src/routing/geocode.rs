//! # Reverse Geocoder
//! Nominatim-style lookup behind a capability trait. Lookup failure never
//! blocks a submission; the caller degrades to [`GeocodeSummary::fallback`].

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::GeocoderConfig;

/// Address summary extracted from one reverse lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeSummary {
    pub area: String,
    pub city: String,
    pub state: String,
    pub full_address: String,
    /// Raw administrative-area hint used for ward synthesis.
    pub ward_hint: String,
}

impl GeocodeSummary {
    /// Fixed degraded summary used when the lookup fails in any way.
    pub fn fallback(city: &str, state: &str) -> Self {
        Self {
            area: "Unknown".to_string(),
            city: city.to_string(),
            state: state.to_string(),
            full_address: "Unknown".to_string(),
            ward_hint: "Unknown".to_string(),
        }
    }

    pub fn has_usable_ward_hint(&self) -> bool {
        !self.ward_hint.trim().is_empty() && self.ward_hint != "Unknown"
    }
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Resolve coordinates to an address summary. Errors are absorbed by the
    /// orchestrator into the fallback summary.
    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<GeocodeSummary>;
    fn name(&self) -> &'static str;
}

/// Live provider against a Nominatim `/reverse` endpoint.
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
    fallback_city: String,
    fallback_state: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Self {
        // Nominatim usage policy requires an identifying agent.
        let http = reqwest::Client::builder()
            .user_agent("civic-intake/0.1 (complaint routing)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            fallback_city: config.fallback_city.clone(),
            fallback_state: config.fallback_state.clone(),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<GeocodeSummary> {
        let url = format!("{}/reverse", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("format", "jsonv2"),
                ("lat", &latitude.to_string()),
                ("lon", &longitude.to_string()),
            ])
            .send()
            .await
            .context("reverse geocode request")?;
        if !resp.status().is_success() {
            bail!("reverse geocode status {}", resp.status());
        }
        let place: WirePlace = resp
            .json()
            .await
            .context("parsing reverse geocode response")?;
        Ok(summarize(place, &self.fallback_city, &self.fallback_state))
    }

    fn name(&self) -> &'static str {
        "nominatim"
    }
}

/// Fixed-answer geocoder for tests and the offline demo.
#[derive(Clone)]
pub struct StaticGeocoder {
    pub fixed: GeocodeSummary,
}

#[async_trait]
impl ReverseGeocoder for StaticGeocoder {
    async fn lookup(&self, _latitude: f64, _longitude: f64) -> Result<GeocodeSummary> {
        Ok(self.fixed.clone())
    }
    fn name(&self) -> &'static str {
        "static"
    }
}

/// Always-failing geocoder used to exercise the degraded path.
pub struct FailingGeocoder;

#[async_trait]
impl ReverseGeocoder for FailingGeocoder {
    async fn lookup(&self, _latitude: f64, _longitude: f64) -> Result<GeocodeSummary> {
        bail!("geocoder offline")
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

#[derive(Debug, Deserialize)]
struct WirePlace {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: WireAddress,
}

#[derive(Debug, Default, Deserialize)]
struct WireAddress {
    #[serde(default)]
    suburb: Option<String>,
    #[serde(default)]
    neighbourhood: Option<String>,
    #[serde(default)]
    city_district: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    municipality: Option<String>,
    #[serde(default)]
    county: Option<String>,
    #[serde(default)]
    state_district: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

fn first_present<'a>(fields: &[&'a Option<String>]) -> Option<&'a str> {
    fields
        .iter()
        .find_map(|f| f.as_deref().filter(|s| !s.trim().is_empty()))
}

fn summarize(place: WirePlace, fallback_city: &str, fallback_state: &str) -> GeocodeSummary {
    let a = &place.address;
    let ward_hint = first_present(&[
        &a.suburb,
        &a.neighbourhood,
        &a.city_district,
        &a.district,
        &a.municipality,
        &a.county,
        &a.state_district,
    ])
    .unwrap_or("Unknown");
    let area = first_present(&[&a.suburb, &a.neighbourhood, &a.city_district]).unwrap_or("Unknown");
    let city =
        first_present(&[&a.city, &a.town, &a.village, &a.municipality]).unwrap_or(fallback_city);
    let state = first_present(&[&a.state]).unwrap_or(fallback_state);
    let full_address = if place.display_name.trim().is_empty() {
        "Unknown".to_string()
    } else {
        place.display_name
    };
    GeocodeSummary {
        area: area.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        full_address,
        ward_hint: ward_hint.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> WireAddress {
        WireAddress::default()
    }

    #[test]
    fn ward_hint_follows_field_priority() {
        let place = WirePlace {
            display_name: "5, 12th Main Rd, Indiranagar, Bengaluru".into(),
            address: WireAddress {
                suburb: Some("Indiranagar".into()),
                city_district: Some("Bengaluru East".into()),
                city: Some("Bengaluru".into()),
                state: Some("Karnataka".into()),
                ..addr()
            },
        };
        let s = summarize(place, "FallbackCity", "FallbackState");
        assert_eq!(s.ward_hint, "Indiranagar");
        assert_eq!(s.area, "Indiranagar");
        assert_eq!(s.city, "Bengaluru");
        assert_eq!(s.state, "Karnataka");
        assert!(s.has_usable_ward_hint());
    }

    #[test]
    fn lower_priority_fields_fill_in_when_suburb_is_missing() {
        let place = WirePlace {
            display_name: String::new(),
            address: WireAddress {
                county: Some("Bengaluru Urban".into()),
                town: Some("Yelahanka".into()),
                ..addr()
            },
        };
        let s = summarize(place, "Bengaluru", "Karnataka");
        assert_eq!(s.ward_hint, "Bengaluru Urban");
        assert_eq!(s.area, "Unknown");
        assert_eq!(s.city, "Yelahanka");
        assert_eq!(s.state, "Karnataka");
        assert_eq!(s.full_address, "Unknown");
    }

    #[test]
    fn empty_payload_degrades_to_defaults() {
        let s = summarize(
            WirePlace {
                display_name: String::new(),
                address: addr(),
            },
            "Bengaluru",
            "Karnataka",
        );
        assert_eq!(s.ward_hint, "Unknown");
        assert!(!s.has_usable_ward_hint());
        assert_eq!(s.city, "Bengaluru");
    }

    #[test]
    fn fallback_summary_is_fixed() {
        let s = GeocodeSummary::fallback("Bengaluru", "Karnataka");
        assert_eq!(s.area, "Unknown");
        assert_eq!(s.full_address, "Unknown");
        assert_eq!(s.ward_hint, "Unknown");
        assert!(!s.has_usable_ward_hint());
    }

    #[tokio::test]
    async fn static_and_failing_geocoders_behave() {
        let ok = StaticGeocoder {
            fixed: GeocodeSummary::fallback("X", "Y"),
        };
        assert!(ok.lookup(0.0, 0.0).await.is_ok());
        assert!(FailingGeocoder.lookup(0.0, 0.0).await.is_err());
    }
}
