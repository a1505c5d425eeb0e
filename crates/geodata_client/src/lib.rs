//! Clients for the public OpenStreetMap geodata services.
//!
//! Overpass answers tag queries inside a bounding box; Nominatim resolves
//! place names and nearby streets. Every request goes through a pluggable
//! [`Transport`] and the bounded retry loop in [`retry`].

pub mod mock;
pub mod nominatim;
pub mod overpass;
pub mod query;
pub mod rate_limit;
pub mod retry;
pub mod transport;

pub use mock::{MockReply, MockTransport};
pub use nominatim::{NominatimClient, DEFAULT_STREETS};
pub use overpass::{OverpassClient, OverpassElement, OverpassResponse};
pub use query::BoundingBox;
pub use rate_limit::RequestLimiter;
pub use retry::{fetch_with_retry, RetryPolicy};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
