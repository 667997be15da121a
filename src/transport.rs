//! The request primitive that actually moves bytes.
//!
//! The dispatcher prepares an [`OutgoingRequest`] and hands it to a
//! [`Transport`]. [`HttpTransport`] sends it with `reqwest`; tests and
//! embedders can plug in their own.

use http::{HeaderMap, Method};
use std::future::Future;
use std::time::{Duration, Instant};

use crate::{Error, RawResponse, Result};

/// A fully prepared request: final URL, headers, and optional body.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// Sends an [`OutgoingRequest`] and resolves with the complete response.
///
/// Any response with a status line, whatever the status, is `Ok`. `Err` is
/// reserved for requests that never produced one.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: OutgoingRequest) -> impl Future<Output = Result<RawResponse>> + Send;
}

/// The default transport, backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with reqwest's default settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    /// Creates a transport whose requests time out after `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;
        Ok(Self { http_client })
    }

    /// Wraps an existing `reqwest::Client`.
    pub fn from_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<RawResponse> {
        let start_time = Instant::now();

        let mut builder = self
            .http_client
            .request(request.method, request.url.as_str())
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        Ok(RawResponse::new(status, headers, body, start_time.elapsed()))
    }
}
