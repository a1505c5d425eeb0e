//! Client-side request pacing for services with a usage policy.
//!
//! Nominatim allows at most one request per second from a client.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Single-bucket limiter shared by clones of a client.
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    limiter: Arc<DirectLimiter>,
}

impl RequestLimiter {
    /// Allow `requests_per_sec` requests per second; zero is raised to one.
    pub fn per_second(requests_per_sec: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_sec).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: Arc::new(GovLimiter::direct(Quota::per_second(rate))),
        }
    }

    /// Wait until a request slot is available.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl Default for RequestLimiter {
    fn default() -> Self {
        Self::per_second(1)
    }
}
