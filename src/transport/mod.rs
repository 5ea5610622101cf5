//! transport
//!
//! Single-shot HTTP requests against a hosting provider's API.
//!
//! # Design
//!
//! The [`Transport`] trait is the seam between repository handles and the
//! network. A transport performs exactly one attempt per call: no retries,
//! no caching. Responses with a status of 300 or above (except 304 Not
//! Modified) are classified as [`ForgeError::Response`] carrying the status
//! and the raw body; failures before a response exists become
//! [`ForgeError::Network`].
//!
//! Handles never call a transport directly. They go through
//! [`channel::spawn_request`], which runs the call on its own task and hands
//! back a [`channel::PendingRequest`] to await later.
//!
//! # Modules
//!
//! - [`channel`]: task-per-request adapter with one-shot result delivery
//! - [`mock`]: in-memory transport for deterministic testing

pub mod channel;
pub mod mock;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use crate::forge::ForgeError;

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = "igitt";

/// HTTP methods used against provider APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully specified request.
#[derive(Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Credential sent as `Authorization: token ...`; empty means anonymous.
    pub token: String,
    pub body: Option<Vec<u8>>,
}

// Custom Debug to avoid exposing the token
impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("has_token", &!self.token.is_empty())
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .finish()
    }
}

/// Performs one HTTP request and returns the response body.
///
/// Implementations must be `Send + Sync + 'static`-friendly so they can be
/// shared with spawned request tasks behind an `Arc`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request once.
    ///
    /// # Errors
    ///
    /// - `Network` if no response could be obtained
    /// - `InvalidRequest` if headers could not be built from the inputs
    /// - `Response` for statuses of 300 and above, except 304
    async fn send(&self, request: TransportRequest) -> Result<Vec<u8>, ForgeError>;
}

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Whole-request timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(5)),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport with the given options.
    ///
    /// # Errors
    ///
    /// `Network` if the underlying HTTP client cannot be initialized.
    pub fn new(options: &TransportOptions) -> Result<Self, ForgeError> {
        let mut builder = Client::builder().user_agent(options.user_agent.clone());
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ForgeError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn headers(token: &str) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if !token.is_empty() {
            let value = HeaderValue::from_str(&format!("token {}", token)).map_err(|_| {
                ForgeError::InvalidRequest("token contains invalid header characters".into())
            })?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<Vec<u8>, ForgeError> {
        let headers = Self::headers(&request.token)?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self
            .client
            .request(request.method.into(), &request.url)
            .headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ForgeError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ForgeError::Network(format!("failed to read response body: {}", e)))?;

        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        if is_error_status(status.as_u16()) {
            return Err(ForgeError::Response {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }
}

/// Statuses of 300 and above are failures, except 304 Not Modified.
pub fn is_error_status(status: u16) -> bool {
    status >= 300 && status != 304
}
