use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::api::collaborators::{Directions, Geocoder};
use crate::error::ProviderError;
use crate::models::landing_models::{Coordinate, Route, TravelMode};
use crate::utils::polyline;

pub const GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Geocoding and directions through the Google Maps web services.
#[derive(Clone)]
pub struct GoogleMapsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GoogleMapsClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, GOOGLE_MAPS_BASE_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value, ProviderError> {
        let response = self.client.get(url).timeout(REQUEST_TIMEOUT).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.to_string(),
                message: format!("Google Maps API returned status code: {}", status),
            });
        }
        let body: Value = response.json().await?;
        check_status(&body)?;
        Ok(body)
    }
}

fn check_status(body: &Value) -> Result<(), ProviderError> {
    match body["status"].as_str() {
        Some("OK") => Ok(()),
        Some("ZERO_RESULTS") | Some("NOT_FOUND") => Err(ProviderError::NoMatch),
        Some(other) => Err(ProviderError::Status {
            status: other.to_string(),
            message: body["error_message"]
                .as_str()
                .unwrap_or("Unknown error")
                .to_string(),
        }),
        None => Err(ProviderError::Malformed("missing status".to_string())),
    }
}

fn parse_location(body: &Value) -> Result<Coordinate, ProviderError> {
    let results = body["results"]
        .as_array()
        .ok_or_else(|| ProviderError::Malformed("No results found".to_string()))?;
    let first = results.first().ok_or(ProviderError::NoMatch)?;
    let location = &first["geometry"]["location"];
    let lat = location["lat"]
        .as_f64()
        .ok_or_else(|| ProviderError::Malformed("Latitude not found".to_string()))?;
    let lng = location["lng"]
        .as_f64()
        .ok_or_else(|| ProviderError::Malformed("Longitude not found".to_string()))?;
    Ok(Coordinate::new(lat, lng))
}

fn parse_route(
    body: &Value,
    origin: Coordinate,
    destination: Coordinate,
    mode: TravelMode,
) -> Result<Route, ProviderError> {
    let first_route = body["routes"]
        .as_array()
        .and_then(|routes| routes.first())
        .ok_or(ProviderError::NoMatch)?;
    let encoded = first_route["overview_polyline"]["points"]
        .as_str()
        .ok_or_else(|| ProviderError::Malformed("Route has no overview polyline".to_string()))?;
    let first_leg = &first_route["legs"][0];

    Ok(Route {
        origin,
        destination,
        mode,
        encoded_polyline: encoded.to_string(),
        path: polyline::decode(encoded)?,
        distance: first_leg["distance"]["text"].as_str().map(str::to_string),
        duration: first_leg["duration"]["text"].as_str().map(str::to_string),
    })
}

#[async_trait]
impl Geocoder for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError> {
        let url = format!(
            "{}/maps/api/geocode/json?address={}&key={}",
            self.base_url,
            urlencoding::encode(address),
            self.api_key
        );
        let body = self.get_json(&url).await?;
        let coordinate = parse_location(&body)?;
        tracing::debug!("Geocoded '{}' to {},{}", address, coordinate.lat, coordinate.lng);
        Ok(coordinate)
    }
}

#[async_trait]
impl Directions for GoogleMapsClient {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Route, ProviderError> {
        let url = format!(
            "{}/maps/api/directions/json?origin={},{}&destination={},{}&mode={}&key={}",
            self.base_url,
            origin.lat,
            origin.lng,
            destination.lat,
            destination.lng,
            mode.as_str(),
            self.api_key
        );
        let body = self.get_json(&url).await?;
        parse_route(&body, origin, destination, mode)
    }
}
