//! Bounded exponential-backoff retry.

use common::config::{HttpConfig, RetryConfig};
use common::Error;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::transport::{HttpRequest, HttpResponse, Transport};

fn summarize_response_body(raw: &str) -> String {
    const MAX_CHARS: usize = 500;
    let compact = raw.replace(['\n', '\r'], " ");
    match compact.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => format!("{}…", &compact[..idx]),
        None => compact,
    }
}

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound on a single attempt.
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            attempt_timeout,
        }
    }

    pub fn from_config(retry: &RetryConfig, http: &HttpConfig) -> Self {
        Self::new(retry.max_attempts, retry.base_delay(), http.timeout())
    }

    /// Wait after failed attempt `attempt` (0-based): `base_delay * 2^attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default(), &HttpConfig::default())
    }
}

/// Execute `request`, retrying transport errors, timeouts and non-2xx
/// statuses. When every attempt fails the last failure is returned inside
/// [`Error::RetriesExhausted`].
pub async fn fetch_with_retry(
    transport: &dyn Transport,
    request: &HttpRequest,
    policy: &RetryPolicy,
) -> Result<HttpResponse, Error> {
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        let failure = match timeout(policy.attempt_timeout, transport.execute(request)).await {
            Ok(Ok(resp)) if resp.is_success() => return Ok(resp),
            Ok(Ok(resp)) => Error::HttpStatus {
                status: resp.status,
                body: summarize_response_body(&resp.body),
            },
            Ok(Err(e)) => e,
            Err(_) => Error::Timeout(policy.attempt_timeout),
        };

        if attempt + 1 >= attempts {
            warn!(
                "Attempt {}/{} for {} failed: {}. Giving up",
                attempt + 1,
                attempts,
                request.url,
                failure
            );
            return Err(Error::RetriesExhausted {
                attempts,
                source: Box::new(failure),
            });
        }

        let delay = policy.delay_after(attempt);
        warn!(
            "Attempt {}/{} for {} failed: {}. Retrying in {:?}",
            attempt + 1,
            attempts,
            request.url,
            failure,
            delay
        );
        sleep(delay).await;
        attempt += 1;
    }
}
