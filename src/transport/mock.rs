//! transport::mock
//!
//! In-memory transport for deterministic testing.
//!
//! # Design
//!
//! Responses are registered per `(method, url)` route. Each route holds a
//! queue: every call pops the front response until one is left, which is
//! then repeated for all further calls. This makes it easy to script a
//! sequence such as "list, create, list again" without a live server.
//!
//! Every request is recorded, so tests can assert how many network calls a
//! handle really made.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use igitt::transport::mock::MockTransport;
//! use igitt::transport::{HttpMethod, Transport, TransportRequest};
//!
//! # tokio_test::block_on(async {
//! let mock = MockTransport::new();
//! mock.respond(HttpMethod::Get, "https://api.example.com/x", r#"{"id":1}"#);
//!
//! let body = mock
//!     .send(TransportRequest {
//!         method: HttpMethod::Get,
//!         url: "https://api.example.com/x".to_string(),
//!         token: String::new(),
//!         body: None,
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(body, br#"{"id":1}"#.to_vec());
//! assert_eq!(mock.call_count(), 1);
//! # });
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{HttpMethod, Transport, TransportRequest};
use crate::forge::ForgeError;

/// Mock transport for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    routes: HashMap<(HttpMethod, String), VecDeque<Result<Vec<u8>, ForgeError>>>,
    requests: Vec<RecordedRequest>,
    latency: Option<Duration>,
}

/// A request the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub token: String,
    pub body: Option<Vec<u8>>,
}

impl MockTransport {
    /// Create a mock with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, to widen windows for concurrency tests.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    /// Queue a successful response body for a route.
    pub fn respond(&self, method: HttpMethod, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.push(method, url.into(), Ok(body.into()));
    }

    /// Queue a JSON response body for a route.
    pub fn respond_json(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        value: &serde_json::Value,
    ) {
        self.push(method, url.into(), Ok(value.to_string().into_bytes()));
    }

    /// Queue a failure for a route.
    pub fn fail(&self, method: HttpMethod, url: impl Into<String>, error: ForgeError) {
        self.push(method, url.into(), Err(error));
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Total number of requests received.
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// Number of requests received for one route.
    pub fn calls_to(&self, method: HttpMethod, url: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    /// Forget recorded requests (routes are kept).
    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    fn push(&self, method: HttpMethod, url: String, response: Result<Vec<u8>, ForgeError>) {
        self.lock()
            .routes
            .entry((method, url))
            .or_default()
            .push_back(response);
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the request and pick its response.
    fn answer(&self, request: TransportRequest) -> (Option<Duration>, Result<Vec<u8>, ForgeError>) {
        let mut inner = self.lock();
        let key = (request.method, request.url.clone());
        inner.requests.push(RecordedRequest {
            method: request.method,
            url: request.url,
            token: request.token,
            body: request.body,
        });

        let response = match inner.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        let response = response.unwrap_or_else(|| {
            Err(ForgeError::Response {
                status: 404,
                body: format!("no mock response for {} {}", key.0, key.1),
            })
        });
        (inner.latency, response)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: TransportRequest) -> Result<Vec<u8>, ForgeError> {
        let (latency, response) = self.answer(request);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        response
    }
}
