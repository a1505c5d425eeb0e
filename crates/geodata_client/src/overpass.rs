//! Overpass interpreter client.
//!
//! Posts QL queries as `data=<urlencoded>` forms and decodes the JSON
//! element list.

use common::config::OverpassConfig;
use common::Error;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::query::{business_type_query, location_analytics_query, BoundingBox};
use crate::retry::{fetch_with_retry, RetryPolicy};
use crate::transport::{HttpRequest, Transport};

// ── Overpass response types ───────────────────────────────────────────

/// Body of an `[out:json]` query.
#[derive(Debug, Clone, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<OverpassElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverpassElement {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub id: i64,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Only sent for ways and relations under `out center`, which the built
    /// queries do not request; their ways come back without coordinates.
    #[serde(default)]
    pub center: Option<Center>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassElement {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Own coordinates, falling back to the computed center.
    pub fn coordinates(&self) -> (Option<f64>, Option<f64>) {
        let lat = self.lat.or(self.center.map(|c| c.lat));
        let lon = self.lon.or(self.center.map(|c| c.lon));
        (lat, lon)
    }
}

// ── Client ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct OverpassClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    bbox_pad_deg: f64,
    query_timeout_secs: u64,
    retry: RetryPolicy,
}

impl OverpassClient {
    pub fn new(transport: Arc<dyn Transport>, config: &OverpassConfig, retry: RetryPolicy) -> Self {
        Self {
            transport,
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            bbox_pad_deg: config.bbox_pad_deg,
            query_timeout_secs: config.query_timeout_secs,
            retry,
        }
    }

    pub fn bounding_box(&self, lat: f64, lng: f64) -> BoundingBox {
        BoundingBox::around(lat, lng, self.bbox_pad_deg)
    }

    /// Run a raw QL query.
    pub async fn interpret(&self, query: &str) -> Result<OverpassResponse, Error> {
        let request = HttpRequest::post_form(&self.endpoint, &[("data", query)]);

        debug!("Posting Overpass query to {} ({} chars)", self.endpoint, query.len());

        let resp = fetch_with_retry(self.transport.as_ref(), &request, &self.retry).await?;
        let data: OverpassResponse = resp.json("Overpass response")?;

        debug!("Overpass returned {} elements", data.elements.len());

        Ok(data)
    }

    /// Elements of the fixed analytics categories around a point.
    pub async fn location_elements(&self, lat: f64, lng: f64) -> Result<OverpassResponse, Error> {
        let query = location_analytics_query(&self.bounding_box(lat, lng), self.query_timeout_secs);
        self.interpret(&query).await
    }

    /// Elements whose `amenity` or `shop` tag equals `business_type`.
    pub async fn business_type_elements(
        &self,
        lat: f64,
        lng: f64,
        business_type: &str,
    ) -> Result<OverpassResponse, Error> {
        let query = business_type_query(
            &self.bounding_box(lat, lng),
            business_type,
            self.query_timeout_secs,
        );
        self.interpret(&query).await
    }
}

impl std::fmt::Debug for OverpassClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverpassClient")
            .field("endpoint", &self.endpoint)
            .field("bbox_pad_deg", &self.bbox_pad_deg)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::transport::Method;
    use std::time::Duration;

    fn sample_response() -> &'static str {
        r#"{
            "version": 0.6,
            "generator": "Overpass API",
            "elements": [
                {
                    "type": "node",
                    "id": 101,
                    "lat": 12.9716,
                    "lon": 77.5946,
                    "tags": {"amenity": "cafe", "name": "Brew House", "opening_hours": "Mo-Su 08:00-22:00"}
                },
                {
                    "type": "way",
                    "id": 202,
                    "center": {"lat": 12.97, "lon": 77.59},
                    "tags": {"shop": "supermarket"}
                },
                {"type": "node", "id": 303, "lat": 12.9, "lon": 77.5}
            ]
        }"#
    }

    fn client(transport: Arc<MockTransport>) -> OverpassClient {
        let config = OverpassConfig {
            endpoint: "https://overpass.test/api/interpreter/".into(),
            ..OverpassConfig::default()
        };
        let retry = RetryPolicy::new(2, Duration::from_millis(10), Duration::from_secs(5));
        OverpassClient::new(transport, &config, retry)
    }

    #[test]
    fn test_deserialize_elements() {
        let parsed: OverpassResponse =
            serde_json::from_str(sample_response()).expect("response should deserialize");

        assert_eq!(parsed.elements.len(), 3);
        assert_eq!(parsed.elements[0].tag("name"), Some("Brew House"));
        assert_eq!(parsed.elements[1].coordinates(), (Some(12.97), Some(77.59)));
        assert!(parsed.elements[2].tags.is_empty());
    }

    #[test]
    fn test_way_without_center_has_no_coordinates() {
        let bbox = BoundingBox::around(12.97, 77.59, 0.1);
        assert!(!location_analytics_query(&bbox, 25).contains("out center"));

        let parsed: OverpassResponse = serde_json::from_str(
            r#"{"elements": [{"type": "way", "id": 9, "nodes": [1, 2], "tags": {"shop": "bakery"}}]}"#,
        )
        .expect("response should deserialize");

        assert_eq!(parsed.elements[0].coordinates(), (None, None));
        assert_eq!(parsed.elements[0].tag("shop"), Some("bakery"));
    }

    #[tokio::test]
    async fn test_location_elements_posts_form_query() {
        let transport = Arc::new(MockTransport::new().then_json(sample_response()));
        let overpass = client(transport.clone());

        let data = overpass
            .location_elements(12.9716, 77.5946)
            .await
            .expect("query should succeed");

        assert_eq!(data.elements.len(), 3);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "https://overpass.test/api/interpreter");
        let query = requests[0].form_field("data").expect("data field");
        assert!(query.contains("[\"amenity\"~\"restaurant|cafe|bank|pharmacy\"]"));
        assert!(query.contains("[timeout:25]"));
    }

    #[tokio::test]
    async fn test_missing_elements_is_parse_error() {
        let transport = Arc::new(MockTransport::new().then_json(r#"{"remark": "runtime error"}"#));
        let overpass = client(transport.clone());

        let err = overpass
            .business_type_elements(12.9, 77.5, "fuel")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(transport.call_count(), 1);
    }
}
