//! HTTP geocoding backends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::debug;

use super::geocoder::{CachingGeocoder, GeocodeError, Geocoder, StaticGeocoder};
use crate::config::{GeocoderConfig, GeocoderProvider};
use crate::geometry::GeoPoint;

pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
pub const GOOGLE_BASE_URL: &str = "https://maps.googleapis.com";

fn http_client(timeout: Duration) -> Result<reqwest::Client, GeocodeError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| GeocodeError::Provider(format!("http client: {err}")))
}

fn request_error(timeout: Duration, err: reqwest::Error) -> GeocodeError {
    if err.is_timeout() {
        GeocodeError::Timeout(timeout)
    } else {
        GeocodeError::Provider(err.to_string())
    }
}

fn ensure_address(address: &str) -> Result<&str, GeocodeError> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        Err(GeocodeError::EmptyAddress)
    } else {
        Ok(trimmed)
    }
}

fn to_point(latitude: f64, longitude: f64) -> Result<GeoPoint, GeocodeError> {
    GeoPoint::new(latitude, longitude)
        .map_err(|err| GeocodeError::InvalidResponse(err.to_string()))
}

/// OpenStreetMap Nominatim search.
#[derive(Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        Ok(Self {
            base_url: base_url.into(),
            user_agent: user_agent.into(),
            timeout,
            client: http_client(timeout)?,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        let address = ensure_address(address)?;

        let response = self
            .client
            .get(self.search_url())
            .header(USER_AGENT, &self.user_agent)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|err| request_error(self.timeout, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Provider(format!("nominatim returned {status}")));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|err| GeocodeError::InvalidResponse(err.to_string()))?;
        let place = places.into_iter().next().ok_or(GeocodeError::NoCandidates)?;

        let latitude = place
            .lat
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidResponse(format!("latitude '{}'", place.lat)))?;
        let longitude = place
            .lon
            .parse::<f64>()
            .map_err(|_| GeocodeError::InvalidResponse(format!("longitude '{}'", place.lon)))?;

        debug!(provider = "nominatim", "address geocoded");
        to_point(latitude, longitude)
    }
}

/// Google Maps Geocoding API.
#[derive(Clone)]
pub struct GoogleGeocoder {
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: GoogleLocation,
}

#[derive(Debug, Deserialize)]
struct GoogleLocation {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout,
            client: http_client(timeout)?,
        })
    }

    fn geocode_url(&self) -> String {
        format!(
            "{}/maps/api/geocode/json",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeoPoint, GeocodeError> {
        let address = ensure_address(address)?;

        let response = self
            .client
            .get(self.geocode_url())
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| request_error(self.timeout, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Provider(format!("google returned {status}")));
        }

        let body: GoogleResponse = response
            .json()
            .await
            .map_err(|err| GeocodeError::InvalidResponse(err.to_string()))?;

        match body.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Err(GeocodeError::NoCandidates),
            other => {
                let detail = body
                    .error_message
                    .map(|message| format!("{other}: {message}"))
                    .unwrap_or_else(|| other.to_string());
                return Err(GeocodeError::Provider(detail));
            }
        }

        let location = body
            .results
            .into_iter()
            .next()
            .ok_or(GeocodeError::NoCandidates)?
            .geometry
            .location;

        debug!(provider = "google", "address geocoded");
        to_point(location.lat, location.lng)
    }
}

/// Builds the configured geocoder. `offline` backs the `static` provider.
pub fn geocoder_from_config(
    config: &GeocoderConfig,
    offline: StaticGeocoder,
) -> Result<Arc<dyn Geocoder>, GeocodeError> {
    let geocoder: Arc<dyn Geocoder> = match config.provider {
        GeocoderProvider::Nominatim => Arc::new(NominatimGeocoder::new(
            config
                .base_url
                .clone()
                .unwrap_or_else(|| NOMINATIM_BASE_URL.to_string()),
            config.user_agent.clone(),
            config.timeout,
        )?),
        GeocoderProvider::Google => Arc::new(GoogleGeocoder::new(
            config
                .base_url
                .clone()
                .unwrap_or_else(|| GOOGLE_BASE_URL.to_string()),
            config.api_key.clone().unwrap_or_default(),
            config.timeout,
        )?),
        GeocoderProvider::Static => Arc::new(offline),
    };

    Ok(match config.cache_ttl {
        Some(ttl) => Arc::new(CachingGeocoder::new(geocoder, ttl)),
        None => geocoder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;
    use serde_json::{json, Value};

    async fn spawn_server(path: &'static str, body: Value) -> String {
        let app = Router::new().route(
            path,
            get(move || {
                let body = body.clone();
                async move { axum::Json(body) }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        format!("http://{addr}")
    }

    #[tokio::test]
    async fn nominatim_parses_string_coordinates() {
        let base_url = spawn_server(
            "/search",
            json!([{ "lat": "41.8786", "lon": "-87.6251", "display_name": "Chicago" }]),
        )
        .await;
        let geocoder = NominatimGeocoder::new(base_url, "open-advocacy-tests", Duration::from_secs(5))
            .expect("client builds");

        let point = geocoder.geocode("121 N LaSalle St").await.expect("geocodes");
        assert!((point.latitude - 41.8786).abs() < 1e-9);
        assert!((point.longitude + 87.6251).abs() < 1e-9);
    }

    #[tokio::test]
    async fn nominatim_empty_result_is_no_candidates() {
        let base_url = spawn_server("/search", json!([])).await;
        let geocoder = NominatimGeocoder::new(base_url, "open-advocacy-tests", Duration::from_secs(5))
            .expect("client builds");

        assert_eq!(
            geocoder.geocode("nowhere at all").await,
            Err(GeocodeError::NoCandidates)
        );
        assert_eq!(geocoder.geocode("  ").await, Err(GeocodeError::EmptyAddress));
    }

    #[tokio::test]
    async fn google_maps_status_codes() {
        let ok = spawn_server(
            "/maps/api/geocode/json",
            json!({
                "status": "OK",
                "results": [{ "geometry": { "location": { "lat": 41.88, "lng": -87.63 } } }]
            }),
        )
        .await;
        let geocoder = GoogleGeocoder::new(ok, "key", Duration::from_secs(5)).expect("client builds");
        let point = geocoder.geocode("City Hall").await.expect("geocodes");
        assert!((point.latitude - 41.88).abs() < 1e-9);

        let zero = spawn_server(
            "/maps/api/geocode/json",
            json!({ "status": "ZERO_RESULTS", "results": [] }),
        )
        .await;
        let geocoder = GoogleGeocoder::new(zero, "key", Duration::from_secs(5)).expect("client builds");
        assert_eq!(geocoder.geocode("x").await, Err(GeocodeError::NoCandidates));

        let denied = spawn_server(
            "/maps/api/geocode/json",
            json!({ "status": "REQUEST_DENIED", "error_message": "bad key" }),
        )
        .await;
        let geocoder = GoogleGeocoder::new(denied, "key", Duration::from_secs(5)).expect("client builds");
        assert_eq!(
            geocoder.geocode("x").await,
            Err(GeocodeError::Provider("REQUEST_DENIED: bad key".to_string()))
        );
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_provider_error() {
        let geocoder = NominatimGeocoder::new(
            "http://127.0.0.1:9",
            "open-advocacy-tests",
            Duration::from_secs(2),
        )
        .expect("client builds");
        assert!(matches!(
            geocoder.geocode("anything").await,
            Err(GeocodeError::Provider(_)) | Err(GeocodeError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn factory_builds_every_provider() {
        let nominatim = GeocoderConfig {
            provider: GeocoderProvider::Nominatim,
            ..GeocoderConfig::default()
        };
        geocoder_from_config(&nominatim, StaticGeocoder::new()).expect("nominatim client");

        let google = GeocoderConfig {
            provider: GeocoderProvider::Google,
            api_key: Some("key".to_string()),
            ..GeocoderConfig::default()
        };
        geocoder_from_config(&google, StaticGeocoder::new()).expect("google client");

        let cached = GeocoderConfig {
            cache_ttl: Some(Duration::from_secs(60)),
            ..GeocoderConfig::offline()
        };
        let known = GeoPoint::new(41.88, -87.63).expect("valid point");
        let geocoder = geocoder_from_config(
            &cached,
            StaticGeocoder::new().with_entry("City Hall", known),
        )
        .expect("static geocoder");
        assert_eq!(geocoder.geocode("City Hall").await, Ok(known));
    }
}
