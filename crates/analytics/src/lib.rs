//! Location analytics: cached, normalised business statistics around a point.
//!
//! Fetches OSM elements through `geodata_client`, aggregates them into
//! per-category counts and map records, and memoises results in a bounded
//! time-boxed cache.

pub mod cache;
pub mod fetcher;
pub mod normalize;
pub mod service;
pub mod streets;

pub use cache::{CacheKey, TimedCache};
pub use fetcher::{AnalyticsFetcher, CachedValue};
pub use service::LocationService;
pub use streets::{rank_streets, StreetReport};
