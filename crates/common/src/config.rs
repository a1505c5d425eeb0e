//! Application configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Outbound HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry policy shared by every upstream call.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Analytics cache limits.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Overpass interpreter settings.
    #[serde(default)]
    pub overpass: OverpassConfig,

    /// Nominatim geocoder settings.
    #[serde(default)]
    pub nominatim: NominatimConfig,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent sent with every request. Both upstreams reject anonymous clients.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_pool_idle")]
    pub pool_max_idle_per_host: usize,
}

/// Exponential backoff parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay after the first failure; doubles after each subsequent one.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

/// Bounded, time-boxed cache limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Entries older than this read as absent.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

/// Overpass interpreter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_endpoint")]
    pub endpoint: String,

    /// Degrees added on each side of the search point.
    #[serde(default = "default_bbox_pad")]
    pub bbox_pad_deg: f64,

    /// Server-side `[timeout:N]` embedded in each query.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

/// Nominatim geocoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimConfig {
    #[serde(default = "default_nominatim_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_search_limit")]
    pub search_limit: u32,

    #[serde(default = "default_street_limit")]
    pub street_limit: u32,

    /// ISO 3166-1 alpha-2 codes restricting place search. Empty means worldwide.
    #[serde(default = "default_country_codes")]
    pub country_codes: Vec<String>,

    #[serde(default = "default_street_viewbox_pad")]
    pub street_viewbox_pad_deg: f64,

    /// Pause before street lookups, per the Nominatim usage policy.
    #[serde(default = "default_reverse_delay_ms")]
    pub reverse_delay_ms: u64,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}

impl NominatimConfig {
    pub fn reverse_delay(&self) -> Duration {
        Duration::from_millis(self.reverse_delay_ms)
    }
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_user_agent() -> String {
    "FirmAI/1.0 (https://firmai.com)".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_pool_idle() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_entries() -> usize {
    100
}
fn default_max_age_secs() -> u64 {
    60
}

fn default_overpass_endpoint() -> String {
    "https://overpass-api.de/api/interpreter".into()
}
fn default_bbox_pad() -> f64 {
    0.1
}
fn default_query_timeout() -> u64 {
    25
}

fn default_nominatim_endpoint() -> String {
    "https://nominatim.openstreetmap.org".into()
}
fn default_language() -> String {
    "en".into()
}
fn default_search_limit() -> u32 {
    10
}
fn default_street_limit() -> u32 {
    50
}
fn default_country_codes() -> Vec<String> {
    vec!["in".into()]
}
fn default_street_viewbox_pad() -> f64 {
    0.02
}
fn default_reverse_delay_ms() -> u64 {
    1000
}
fn default_requests_per_second() -> u32 {
    1
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            pool_max_idle_per_host: default_pool_idle(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            max_age_secs: default_max_age_secs(),
        }
    }
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            endpoint: default_overpass_endpoint(),
            bbox_pad_deg: default_bbox_pad(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            endpoint: default_nominatim_endpoint(),
            language: default_language(),
            search_limit: default_search_limit(),
            street_limit: default_street_limit(),
            country_codes: default_country_codes(),
            street_viewbox_pad_deg: default_street_viewbox_pad(),
            reverse_delay_ms: default_reverse_delay_ms(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let raw = r#"
            [cache]
            max_entries = 10

            [overpass]
            endpoint = "http://localhost:12345/api/interpreter"
        "#;

        let cfg: AppConfig = toml::from_str(raw).expect("config should parse");

        assert_eq!(cfg.cache.max_entries, 10);
        assert_eq!(cfg.cache.max_age_secs, 60);
        assert_eq!(cfg.overpass.endpoint, "http://localhost:12345/api/interpreter");
        assert!((cfg.overpass.bbox_pad_deg - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.nominatim.country_codes, vec!["in".to_string()]);
    }

    #[test]
    fn test_default_durations() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.http.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.retry.base_delay(), Duration::from_secs(1));
        assert_eq!(cfg.cache.max_age(), Duration::from_secs(60));
        assert_eq!(cfg.nominatim.reverse_delay(), Duration::from_secs(1));
    }
}
