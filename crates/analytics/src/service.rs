//! Facade wiring the Overpass and Nominatim clients to one transport.

use common::{AnalyticsResult, AppConfig, BusinessRecord, Error, LocationMatch};
use geodata_client::{
    NominatimClient, OverpassClient, ReqwestTransport, RetryPolicy, Transport, DEFAULT_STREETS,
};
use std::sync::Arc;
use tracing::warn;

use crate::fetcher::AnalyticsFetcher;
use crate::streets::{rank_streets, StreetReport};

#[derive(Debug)]
pub struct LocationService {
    analytics: AnalyticsFetcher,
    nominatim: NominatimClient,
}

impl LocationService {
    /// Build against the live services described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let transport = Arc::new(ReqwestTransport::new(&config.http)?);
        Ok(Self::with_transport(transport, config))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, config: &AppConfig) -> Self {
        let retry = RetryPolicy::from_config(&config.retry, &config.http);
        let overpass = OverpassClient::new(transport.clone(), &config.overpass, retry.clone());
        let nominatim = NominatimClient::new(transport, &config.nominatim, retry);

        Self {
            analytics: AnalyticsFetcher::with_cache_config(overpass, &config.cache),
            nominatim,
        }
    }

    pub fn analytics(&self) -> &AnalyticsFetcher {
        &self.analytics
    }

    pub fn nominatim(&self) -> &NominatimClient {
        &self.nominatim
    }

    pub async fn fetch_location_analytics(&self, lat: f64, lng: f64, radius: f64) -> AnalyticsResult {
        self.analytics.fetch_location_analytics(lat, lng, radius).await
    }

    pub async fn search_businesses_by_type(
        &self,
        lat: f64,
        lng: f64,
        radius: f64,
        business_type: &str,
    ) -> Vec<BusinessRecord> {
        self.analytics
            .search_businesses_by_type(lat, lng, radius, business_type)
            .await
    }

    /// Place search; failures yield an empty list.
    pub async fn search_location_or_empty(&self, query: &str) -> Vec<LocationMatch> {
        match self.nominatim.search_location(query).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Error searching locations for {query:?}: {e}");
                Vec::new()
            }
        }
    }

    /// Nearby streets; failures yield [`DEFAULT_STREETS`].
    pub async fn nearby_streets_or_default(&self, lat: f64, lon: f64) -> Vec<String> {
        match self.nominatim.nearby_streets(lat, lon).await {
            Ok(streets) => streets,
            Err(e) => {
                warn!("Error finding streets near ({lat},{lon}): {e}");
                DEFAULT_STREETS.iter().map(|s| s.to_string()).collect()
            }
        }
    }

    /// Rank the streets around a point by the businesses on them.
    pub async fn best_streets(&self, lat: f64, lng: f64, radius: f64) -> Vec<StreetReport> {
        let streets = self.nearby_streets_or_default(lat, lng).await;
        let analytics = self.fetch_location_analytics(lat, lng, radius).await;
        rank_streets(&streets, &analytics)
    }

    /// Fallible form of [`Self::best_streets`].
    pub async fn try_best_streets(
        &self,
        lat: f64,
        lng: f64,
        radius: f64,
    ) -> Result<Vec<StreetReport>, Error> {
        let streets = self.nominatim.nearby_streets(lat, lng).await?;
        let analytics = self
            .analytics
            .try_fetch_location_analytics(lat, lng, radius)
            .await?;
        Ok(rank_streets(&streets, &analytics))
    }
}
