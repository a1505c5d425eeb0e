//! Cached analytics and business-type search over Overpass.
//!
//! The `try_*` methods report failures. The plain methods keep the dashboard
//! contract of always returning something: any failure becomes the
//! zero-valued result (or an empty list) and is logged, so to their callers
//! an outage looks the same as an area with no businesses.

use common::config::CacheConfig;
use common::{AnalyticsResult, BusinessRecord, Error};
use geodata_client::OverpassClient;
use tracing::{debug, warn};

use crate::cache::{CacheKey, TimedCache};
use crate::normalize::{filter_business_type, summarize_location};

/// A memoised result of either kind, so one cache serves both paths.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Analytics(AnalyticsResult),
    Businesses(Vec<BusinessRecord>),
}

#[derive(Debug)]
pub struct AnalyticsFetcher {
    overpass: OverpassClient,
    cache: TimedCache<CachedValue>,
}

impl AnalyticsFetcher {
    pub fn new(overpass: OverpassClient, cache: TimedCache<CachedValue>) -> Self {
        Self { overpass, cache }
    }

    pub fn with_cache_config(overpass: OverpassClient, config: &CacheConfig) -> Self {
        Self::new(overpass, TimedCache::from_config(config))
    }

    pub fn cache(&self) -> &TimedCache<CachedValue> {
        &self.cache
    }

    /// Business counts, density and map records around `(lat, lng)`.
    pub async fn try_fetch_location_analytics(
        &self,
        lat: f64,
        lng: f64,
        radius: f64,
    ) -> Result<AnalyticsResult, Error> {
        let key = CacheKey::analytics(lat, lng, radius);
        if let Some(CachedValue::Analytics(cached)) = self.cache.get(&key) {
            return Ok(cached);
        }

        let data = self.overpass.location_elements(lat, lng).await?;
        let result = summarize_location(&data.elements, radius);

        debug!(
            "Analytics for ({lat},{lng}) r={radius}: {} businesses, density {:.2}",
            result.total_businesses, result.business_density
        );

        self.cache.set(key, CachedValue::Analytics(result.clone()));
        Ok(result)
    }

    /// Like [`Self::try_fetch_location_analytics`], but failures yield
    /// [`AnalyticsResult::empty`].
    pub async fn fetch_location_analytics(&self, lat: f64, lng: f64, radius: f64) -> AnalyticsResult {
        match self.try_fetch_location_analytics(lat, lng, radius).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Error fetching location analytics for ({lat},{lng}): {e}");
                AnalyticsResult::empty()
            }
        }
    }

    /// Businesses tagged `amenity=<type>` or `shop=<type>` around `(lat, lng)`.
    pub async fn try_search_businesses_by_type(
        &self,
        lat: f64,
        lng: f64,
        radius: f64,
        business_type: &str,
    ) -> Result<Vec<BusinessRecord>, Error> {
        let key = CacheKey::search(lat, lng, radius, business_type);
        if let Some(CachedValue::Businesses(cached)) = self.cache.get(&key) {
            return Ok(cached);
        }

        let data = self
            .overpass
            .business_type_elements(lat, lng, business_type)
            .await?;
        let businesses = filter_business_type(&data.elements, business_type);

        debug!(
            "Search for {business_type:?} at ({lat},{lng}): {} businesses",
            businesses.len()
        );

        self.cache.set(key, CachedValue::Businesses(businesses.clone()));
        Ok(businesses)
    }

    /// Like [`Self::try_search_businesses_by_type`], but failures yield an
    /// empty list.
    pub async fn search_businesses_by_type(
        &self,
        lat: f64,
        lng: f64,
        radius: f64,
        business_type: &str,
    ) -> Vec<BusinessRecord> {
        match self
            .try_search_businesses_by_type(lat, lng, radius, business_type)
            .await
        {
            Ok(businesses) => businesses,
            Err(e) => {
                warn!("Error searching {business_type:?} businesses at ({lat},{lng}): {e}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::OverpassConfig;
    use common::Category;
    use geodata_client::{MockTransport, RetryPolicy};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::advance;

    const TWO_CAFES_ONE_BANK: &str = r#"{"elements": [
        {"type": "node", "id": 1, "lat": 28.61, "lon": 77.20, "tags": {"amenity": "cafe", "name": "Blue Tokai"}},
        {"type": "node", "id": 2, "lat": 28.62, "lon": 77.21, "tags": {"amenity": "cafe"}},
        {"type": "node", "id": 3, "lat": 28.63, "lon": 77.22, "tags": {"amenity": "bank", "name": "SBI"}},
        {"type": "node", "id": 4, "lat": 28.63, "lon": 77.22}
    ]}"#;

    fn fetcher(transport: Arc<MockTransport>) -> AnalyticsFetcher {
        let retry = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(30));
        let overpass = OverpassClient::new(transport, &OverpassConfig::default(), retry);
        AnalyticsFetcher::with_cache_config(overpass, &CacheConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_analytics_aggregates_response() {
        let transport = Arc::new(MockTransport::new().then_json(TWO_CAFES_ONE_BANK));
        let result = fetcher(transport)
            .fetch_location_analytics(28.61, 77.20, 2.0)
            .await;

        assert_eq!(result.total_businesses, 3);
        assert_eq!(result.count(Category::Cafe), 2);
        assert_eq!(result.count(Category::Bank), 1);
        assert_eq!(result.count(Category::Pharmacy), 0);
        assert!((result.business_density - 3.0 / (std::f64::consts::PI * 4.0)).abs() < 1e-12);
        assert_eq!(result.nearby_businesses[1].name, "Unnamed Business");
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_matching_elements_is_zero_valued() {
        let transport = Arc::new(MockTransport::new().then_json(r#"{"elements": []}"#));
        let result = fetcher(transport)
            .fetch_location_analytics(28.61, 77.20, 1.0)
            .await;

        assert_eq!(result, AnalyticsResult::empty());
        assert_eq!(result.business_density, 0.0);
        assert!(result.nearby_businesses.is_empty());
    }

    // Locks in current behaviour: an outage is indistinguishable from an
    // empty area through the infallible entry point.
    #[tokio::test(start_paused = true)]
    async fn test_network_error_looks_like_no_results() {
        let transport = Arc::new(MockTransport::new());
        let f = fetcher(transport.clone());

        let result = f.fetch_location_analytics(28.61, 77.20, 1.0).await;

        assert_eq!(result, AnalyticsResult::empty());
        assert_eq!(transport.call_count(), 3);
        assert!(f.cache().is_empty(), "failures must not be cached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_variant_surfaces_failure() {
        let transport = Arc::new(MockTransport::new());
        let err = fetcher(transport)
            .try_fetch_location_analytics(28.61, 77.20, 1.0)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
        assert!(matches!(err.root(), Error::Http(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parse_failure_is_distinct() {
        let transport = Arc::new(MockTransport::new().then_json(r#"{"remark": "timeout"}"#));
        let err = fetcher(transport)
            .try_fetch_location_analytics(28.61, 77.20, 1.0)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_within_max_age_hits_cache() {
        let transport = Arc::new(
            MockTransport::new()
                .then_json(TWO_CAFES_ONE_BANK)
                .then_json(r#"{"elements": []}"#),
        );
        let f = fetcher(transport.clone());

        let first = f.fetch_location_analytics(28.61, 77.20, 1.0).await;
        advance(Duration::from_secs(30)).await;
        let second = f.fetch_location_analytics(28.61, 77.20, 1.0).await;

        assert_eq!(transport.call_count(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetches_after_max_age() {
        let transport = Arc::new(
            MockTransport::new()
                .then_json(TWO_CAFES_ONE_BANK)
                .then_json(r#"{"elements": []}"#),
        );
        let f = fetcher(transport.clone());

        f.fetch_location_analytics(28.61, 77.20, 1.0).await;
        advance(Duration::from_secs(61)).await;
        let second = f.fetch_location_analytics(28.61, 77.20, 1.0).await;

        assert_eq!(transport.call_count(), 2);
        assert_eq!(second.total_businesses, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_by_type_filters_and_caches() {
        let body = r#"{"elements": [
            {"type": "node", "id": 7, "lat": 28.6, "lon": 77.2,
             "tags": {"amenity": "fuel", "name": "Indian Oil", "phone": "+91 11 2345 6789", "payment": "cash"}},
            {"type": "node", "id": 8, "lat": 28.6, "lon": 77.2, "tags": {"amenity": "cafe"}}
        ]}"#;
        let transport = Arc::new(MockTransport::new().then_json(body));
        let f = fetcher(transport.clone());

        let found = f.search_businesses_by_type(28.6, 77.2, 1.0, "fuel").await;
        let again = f.search_businesses_by_type(28.6, 77.2, 1.0, "fuel").await;

        assert_eq!(transport.call_count(), 1);
        assert_eq!(found, again);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Indian Oil");
        assert_eq!(found[0].phone.as_deref(), Some("+91 11 2345 6789"));
        assert_eq!(found[0].amenities, vec!["cash"]);

        let query = transport.requests()[0].form_field("data").unwrap();
        assert!(query.contains("[\"amenity\"=\"fuel\"]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_failure_is_empty_list() {
        let transport = Arc::new(MockTransport::new().otherwise(
            geodata_client::MockReply::Response(geodata_client::HttpResponse::new(504, "")),
        ));
        let found = fetcher(transport.clone())
            .search_businesses_by_type(28.6, 77.2, 1.0, "fuel")
            .await;

        assert!(found.is_empty());
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_analytics_and_search_keys_do_not_collide() {
        let transport = Arc::new(
            MockTransport::new()
                .then_json(TWO_CAFES_ONE_BANK)
                .then_json(TWO_CAFES_ONE_BANK),
        );
        let f = fetcher(transport.clone());

        let analytics = f.fetch_location_analytics(28.61, 77.20, 1.0).await;
        let cafes = f.search_businesses_by_type(28.61, 77.20, 1.0, "cafe").await;

        assert_eq!(transport.call_count(), 2);
        assert_eq!(analytics.total_businesses, 3);
        assert_eq!(cafes.len(), 2);
        assert_eq!(f.cache().len(), 2);
    }
}
