//! Message-bus client for the gateway.
//!
//! Every backend interaction is a synchronous request/reply exchange on a
//! named subject with a bounded timeout. The transport is reached through the
//! [`Bus`] trait so handlers and the store facade never depend on a concrete
//! client; the process-wide [`HttpBus`] is constructed once at startup and
//! injected by handle.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a bus request. A timeout is a gateway failure and is
/// not retried here; retry policy, if any, belongs to the caller.
#[derive(Debug, Error)]
pub enum BusError {
    /// The reply did not arrive within the configured timeout.
    #[error("bus request timed out")]
    Timeout,
    /// The transport failed before a reply was produced.
    #[error("bus transport error: {0}")]
    Transport(String),
}

/// Request/reply access to the backend bus.
#[async_trait]
pub trait Bus: Send + Sync {
    /// Publishes `payload` on `subject` and waits for a single reply.
    async fn request(&self, subject: &str, payload: Vec<u8>) -> Result<Vec<u8>, BusError>;
}

/// Bus client speaking to the HTTP bridge in front of the bus: one POST per
/// subject, the reply body being the bus reply.
pub struct HttpBus {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBus {
    /// Creates a client against `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BusError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BusError::Transport(e.to_string()))?;

        Ok(HttpBus {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Bus for HttpBus {
    async fn request(&self, subject: &str, payload: Vec<u8>) -> Result<Vec<u8>, BusError> {
        let url = format!("{}/{}", self.base_url, subject);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BusError::Timeout
                } else {
                    BusError::Transport(e.to_string())
                }
            })?;

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                BusError::Timeout
            } else {
                BusError::Transport(e.to_string())
            }
        })?;

        Ok(body.to_vec())
    }
}
