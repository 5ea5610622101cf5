//! transport::channel
//!
//! Runs each request on its own task and delivers the outcome through a
//! one-shot channel.
//!
//! # Design
//!
//! Starting a request and waiting for it are separate steps. The caller gets
//! a [`PendingRequest`] back immediately and is free to do other work; it
//! only suspends when it calls [`PendingRequest::wait`]. The error and the
//! body travel together as one `Result`, so a caller can never read one
//! without the other.
//!
//! Requests that carry a payload (POST, DELETE) can be started before the
//! payload exists. The task waits on the [`PayloadSender`] half first and
//! only then sends the request. [`PayloadSender::send_empty`] sends it
//! without a body. Dropping the sender without either call aborts the
//! request: it resolves to [`ForgeError::InvalidRequest`] and the transport
//! is never called.
//!
//! The URL is checked before a task is spawned. A malformed URL produces a
//! `PendingRequest` that is already resolved to
//! [`ForgeError::InvalidRequest`] and the transport is never called.
//!
//! There is no cancellation or timeout here; a started request runs until
//! the transport returns.
//!
//! All `spawn_*` functions must be called from within a Tokio runtime.

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::oneshot;
use tracing::trace;

use super::{HttpMethod, Transport, TransportRequest};
use crate::forge::ForgeError;

/// Outcome of a request that may still be in flight.
#[derive(Debug)]
#[must_use = "a pending request does nothing useful unless awaited"]
pub struct PendingRequest {
    rx: oneshot::Receiver<Result<Vec<u8>, ForgeError>>,
}

impl PendingRequest {
    fn resolved(result: Result<Vec<u8>, ForgeError>) -> Self {
        let (tx, rx) = oneshot::channel();
        // The receiver is alive in `rx`, so this cannot fail.
        let _ = tx.send(result);
        Self { rx }
    }

    /// Wait for the response body.
    ///
    /// # Errors
    ///
    /// Whatever the transport returned, or `Network` if the request task
    /// ended without producing a result.
    pub async fn wait(self) -> Result<Vec<u8>, ForgeError> {
        self.rx.await.unwrap_or_else(|_| {
            Err(ForgeError::Network(
                "request task ended without a response".to_string(),
            ))
        })
    }
}

/// Input half for a request whose payload is supplied after it was started.
#[derive(Debug)]
pub struct PayloadSender {
    tx: oneshot::Sender<Option<Vec<u8>>>,
}

impl PayloadSender {
    /// Hand the payload to the request task.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the request was rejected before it started and
    /// nobody is waiting for a payload.
    pub fn send(self, payload: Vec<u8>) -> Result<(), ForgeError> {
        self.tx.send(Some(payload)).map_err(|_| {
            ForgeError::InvalidRequest("request is no longer waiting for a payload".to_string())
        })
    }

    /// Let the request go out without a body.
    pub fn send_empty(self) {
        let _ = self.tx.send(None);
    }
}

/// Start a request without a body.
pub fn spawn_request(
    transport: Arc<dyn Transport>,
    method: HttpMethod,
    url: impl Into<String>,
    token: impl Into<String>,
) -> PendingRequest {
    let url = url.into();
    if let Err(err) = check_url(&url) {
        return PendingRequest::resolved(Err(err));
    }

    let request = TransportRequest {
        method,
        url,
        token: token.into(),
        body: None,
    };
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        trace!(method = %request.method, url = %request.url, "request task started");
        let _ = tx.send(transport.send(request).await);
    });
    PendingRequest { rx }
}

/// Start a request whose payload will be supplied through the returned
/// [`PayloadSender`].
pub fn spawn_request_with_payload(
    transport: Arc<dyn Transport>,
    method: HttpMethod,
    url: impl Into<String>,
    token: impl Into<String>,
) -> (PayloadSender, PendingRequest) {
    let (payload_tx, payload_rx) = oneshot::channel::<Option<Vec<u8>>>();
    let sender = PayloadSender { tx: payload_tx };

    let url = url.into();
    if let Err(err) = check_url(&url) {
        return (sender, PendingRequest::resolved(Err(err)));
    }

    let token = token.into();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let body = match payload_rx.await {
            Ok(body) => body,
            Err(_) => {
                trace!(%method, %url, "payload sender dropped, request aborted");
                let _ = tx.send(Err(ForgeError::InvalidRequest(format!(
                    "{} {}: payload was never supplied",
                    method, url
                ))));
                return;
            }
        };
        trace!(%method, %url, has_body = body.is_some(), "request task started");
        let request = TransportRequest {
            method,
            url,
            token,
            body,
        };
        let _ = tx.send(transport.send(request).await);
    });
    (sender, PendingRequest { rx })
}

fn check_url(url: &str) -> Result<(), ForgeError> {
    let parsed =
        Url::parse(url).map_err(|e| ForgeError::InvalidRequest(format!("'{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ForgeError::InvalidRequest(format!(
            "'{}': unsupported scheme '{}'",
            url, other
        ))),
    }
}
