//! Scripted [`Transport`] for tests.
//!
//! Replies are consumed in order; once the script runs out the fallback
//! reply (a network error unless overridden) is returned. Every call is
//! recorded together with the tokio instant it happened at, so backoff
//! timing can be asserted under a paused clock.

use async_trait::async_trait;
use common::Error;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

use crate::transport::{HttpRequest, HttpResponse, Transport};

/// A canned outcome for one call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(HttpResponse),
    NetworkError(String),
    /// Never completes; exercises per-attempt timeouts.
    Hang,
}

#[derive(Debug)]
pub struct MockTransport {
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    calls: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: MockReply::NetworkError("no scripted reply".into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, reply: MockReply) -> Self {
        self.script
            .lock()
            .expect("mock script lock poisoned")
            .push_back(reply);
        self
    }

    pub fn then_json(self, body: &str) -> Self {
        self.then(MockReply::Response(HttpResponse::new(200, body)))
    }

    pub fn then_status(self, status: u16, body: &str) -> Self {
        self.then(MockReply::Response(HttpResponse::new(status, body)))
    }

    pub fn then_network_error(self, message: &str) -> Self {
        self.then(MockReply::NetworkError(message.into()))
    }

    /// Reply used once the script is exhausted.
    pub fn otherwise(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock calls lock poisoned").len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.calls
            .lock()
            .expect("mock calls lock poisoned")
            .iter()
            .map(|(_, req)| req.clone())
            .collect()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls
            .lock()
            .expect("mock calls lock poisoned")
            .iter()
            .map(|(at, _)| *at)
            .collect()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        self.calls
            .lock()
            .expect("mock calls lock poisoned")
            .push((Instant::now(), request.clone()));

        let reply = self
            .script
            .lock()
            .expect("mock script lock poisoned")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            MockReply::Response(resp) => Ok(resp),
            MockReply::NetworkError(message) => Err(Error::Http(message)),
            MockReply::Hang => std::future::pending().await,
        }
    }
}
