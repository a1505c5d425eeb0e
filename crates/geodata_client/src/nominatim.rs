//! Nominatim geocoder client.
//!
//! Free-text place search and nearby street discovery. Requests are paced
//! by a [`RequestLimiter`] and street lookups wait a courtesy delay first,
//! as the public instance's usage policy asks.

use common::config::NominatimConfig;
use common::{Address, Error, LocationMatch};
use serde::Deserialize;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::debug;

use crate::rate_limit::RequestLimiter;
use crate::retry::{fetch_with_retry, RetryPolicy};
use crate::transport::{HttpRequest, Transport};

/// Returned when neither street search nor reverse geocoding names a road.
pub const DEFAULT_STREETS: [&str; 5] = [
    "Market Street",
    "Commercial Avenue",
    "Business District",
    "Shopping Plaza",
    "Main Road",
];

const UNKNOWN_LOCATION: &str = "Unknown Location";

// ── Nominatim response types ──────────────────────────────────────────

/// One hit from `/search?format=json`.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    /// Numeric on the public instance, a string on some mirrors.
    pub place_id: serde_json::Value,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub osm_type: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

/// Body of `/reverse?format=json`. Failed lookups carry only `error`.
#[derive(Debug, Deserialize)]
pub struct ReverseResult {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub error: Option<String>,
}

fn parse_coordinate(raw: &str, field: &str) -> Result<f64, Error> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::Parse(format!("Nominatim {field} is not a number: {raw:?}")))
}

fn place_id_string(value: &serde_json::Value) -> Result<String, Error> {
    match value {
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::String(s) => Ok(s.clone()),
        other => Err(Error::Parse(format!("Nominatim place_id has unexpected type: {other}"))),
    }
}

impl SearchHit {
    pub fn into_location(self) -> Result<LocationMatch, Error> {
        let display_name = self
            .address
            .as_ref()
            .and_then(Address::display_name)
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        Ok(LocationMatch {
            place_id: place_id_string(&self.place_id)?,
            lat: parse_coordinate(&self.lat, "lat")?,
            lon: parse_coordinate(&self.lon, "lon")?,
            display_name,
            osm_type: self.osm_type.unwrap_or_default(),
            address: self.address,
        })
    }
}

// ── Client ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct NominatimClient {
    transport: Arc<dyn Transport>,
    config: NominatimConfig,
    endpoint: String,
    retry: RetryPolicy,
    limiter: RequestLimiter,
}

impl NominatimClient {
    pub fn new(transport: Arc<dyn Transport>, config: &NominatimConfig, retry: RetryPolicy) -> Self {
        Self {
            transport,
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            limiter: RequestLimiter::per_second(config.requests_per_second),
            config: config.clone(),
            retry,
        }
    }

    fn request(&self, path: &str) -> HttpRequest {
        HttpRequest::get(format!("{}{}", self.endpoint, path))
            .header("Accept-Language", self.config.language.as_str())
            .query("format", "json")
            .query("addressdetails", "1")
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: HttpRequest,
        what: &str,
    ) -> Result<T, Error> {
        self.limiter.wait().await;
        debug!("Fetching Nominatim {}: {}", what, request.url);
        let resp = fetch_with_retry(self.transport.as_ref(), &request, &self.retry).await?;
        resp.json(what)
    }

    /// Places matching a free-text query.
    pub async fn search_location(&self, query: &str) -> Result<Vec<LocationMatch>, Error> {
        let mut request = self
            .request("/search")
            .query("q", query)
            .query("limit", self.config.search_limit.to_string());
        if !self.config.country_codes.is_empty() {
            request = request.query("countrycodes", self.config.country_codes.join(","));
        }
        let request = request.query("accept-language", self.config.language.as_str());

        let hits: Vec<SearchHit> = self.send(request, "search response").await?;

        debug!("Nominatim search {:?} returned {} hits", query, hits.len());

        hits.into_iter().map(SearchHit::into_location).collect()
    }

    /// Unique road names near a point, in first-seen order.
    ///
    /// Falls back to reverse geocoding the point itself, then to
    /// [`DEFAULT_STREETS`].
    pub async fn nearby_streets(&self, lat: f64, lon: f64) -> Result<Vec<String>, Error> {
        sleep(self.config.reverse_delay()).await;

        let pad = self.config.street_viewbox_pad_deg;
        let request = self
            .request("/search")
            .query("limit", self.config.street_limit.to_string())
            .query("accept-language", self.config.language.as_str())
            .query("street", "1")
            .query("highway", "*")
            .query("bounded", "1")
            .query(
                "viewbox",
                format!("{},{},{},{}", lon - pad, lat - pad, lon + pad, lat + pad),
            );

        let hits: Vec<SearchHit> = self.send(request, "street search response").await?;

        let mut streets: Vec<String> = Vec::new();
        for road in hits
            .iter()
            .filter_map(|hit| hit.address.as_ref()?.road.as_deref())
        {
            if !streets.iter().any(|s| s == road) {
                streets.push(road.to_string());
            }
        }

        if streets.is_empty() {
            debug!("No streets in viewbox around ({lat},{lon}); reverse geocoding");
            let request = self
                .request("/reverse")
                .query("lat", lat.to_string())
                .query("lon", lon.to_string())
                .query("zoom", "18");

            let reverse: ReverseResult = self.send(request, "reverse response").await?;
            if let Some(error) = &reverse.error {
                debug!("Nominatim reverse lookup for ({lat},{lon}) failed: {error}");
            }
            if let Some(road) = reverse.address.and_then(|a| a.road) {
                streets.push(road);
            }
        }

        if streets.is_empty() {
            return Ok(DEFAULT_STREETS.iter().map(|s| s.to_string()).collect());
        }

        Ok(streets)
    }
}

impl std::fmt::Debug for NominatimClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominatimClient")
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .finish()
    }
}
