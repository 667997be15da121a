//! The request dispatcher.
//!
//! [`Client::request`] merges options over the defaults, builds the final URL
//! and body, sends through the client's [`Transport`], and runs the success,
//! error, and complete callbacks once the request reaches its terminal state.

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::callback::{CompleteCallback, ErrorCallback, SuccessCallback};
use crate::encode;
use crate::response::is_success_status;
use crate::transport::{HttpTransport, OutgoingRequest, Transport};
use crate::{
    Error, Payload, RequestConfig, RequestHandle, RequestOptions, ResponseBody, Result, Settings,
};

/// Dispatches requests through a [`Transport`].
///
/// The client is cheap to clone and holds only immutable configuration: the
/// transport, an optional base URL for relative request URLs, and headers
/// added to every request.
///
/// # Examples
///
/// ```no_run
/// use xhrkit::{Client, Payload, RequestOptions, ResponseType};
///
/// # async fn example() -> Result<(), xhrkit::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
///
/// let handle = client
///     .request(
///         RequestOptions::new()
///             .url("/search")
///             .payload(Payload::new().with("q", "rust"))
///             .response_type(ResponseType::Json)
///             .on_success(|_settings, body, status, _handle| {
///                 println!("{}: {:?}", status, body.as_json());
///             })
///             .on_error(|_settings, handle, status| {
///                 eprintln!("{} failed with {}", handle.url(), status);
///             }),
///     )
///     .await;
///
/// handle.wait().await?;
/// # Ok(())
/// # }
/// ```
pub struct Client<T: Transport = HttpTransport> {
    inner: Arc<ClientInner<T>>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<T> {
    transport: T,
    base_url: Option<Url>,
    default_headers: HeaderMap,
}

impl Client<HttpTransport> {
    /// Creates a client with the default reqwest transport, no base URL and
    /// no default headers.
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::from_client(reqwest::Client::new()))
    }

    /// Creates a new [`ClientBuilder`].
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl Default for Client<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client around a custom transport.
    pub fn with_transport(transport: T) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                base_url: None,
                default_headers: HeaderMap::new(),
            }),
        }
    }

    /// Returns the transport requests are sent through.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Dispatches a request and returns its handle.
    ///
    /// In asynchronous mode (the default) the request runs on a spawned
    /// tokio task and this returns as soon as it has been handed off. In
    /// synchronous mode this returns only after the response arrived and
    /// every callback ran.
    ///
    /// The handle is returned whatever the outcome; outcomes are reported
    /// through the callbacks and the handle itself.
    pub async fn request(&self, options: RequestOptions) -> RequestHandle {
        let RequestConfig {
            settings,
            on_success,
            on_error,
            on_complete,
        } = options.merge();

        let (target, body) = build_target(&settings);
        let outgoing = self.inner.prepare(&settings, &target, body);
        let url = match &outgoing {
            Ok(request) => request.url.clone(),
            Err(_) => target,
        };

        let handle = RequestHandle::new(settings.method.clone(), url);
        tracing::debug!(
            method = %settings.method,
            url = %handle.url(),
            is_async = settings.is_async,
            response_type = %settings.response_type,
            "Dispatching request"
        );
        handle.mark_opened();

        let is_async = settings.is_async;
        let exchange = Exchange {
            settings,
            on_success,
            on_error,
            on_complete,
            handle: handle.clone(),
        };

        if is_async {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.execute(outgoing, exchange).await });
        } else {
            self.inner.execute(outgoing, exchange).await;
        }

        handle
    }

    /// Dispatches a GET request.
    ///
    /// The payload, if any, is appended to the URL as a query string.
    pub async fn get(
        &self,
        url: impl Into<String>,
        payload: Option<Payload>,
        on_success: Option<SuccessCallback>,
    ) -> RequestHandle {
        self.call(Method::GET, url.into(), payload, on_success).await
    }

    /// Dispatches a POST request.
    ///
    /// The payload, if any, is sent as a form-encoded body.
    pub async fn post(
        &self,
        url: impl Into<String>,
        payload: Option<Payload>,
        on_success: Option<SuccessCallback>,
    ) -> RequestHandle {
        self.call(Method::POST, url.into(), payload, on_success).await
    }

    async fn call(
        &self,
        method: Method,
        url: String,
        payload: Option<Payload>,
        on_success: Option<SuccessCallback>,
    ) -> RequestHandle {
        let options = RequestOptions {
            url: Some(url),
            method: Some(method),
            payload: Some(payload),
            on_success: Some(on_success),
            ..RequestOptions::default()
        };
        self.request(options).await
    }
}

/// Builds the target URL and the body from merged settings.
///
/// The cache-buster comes first, then a GET payload as query string. Any
/// other method gets the payload as body.
fn build_target(settings: &Settings) -> (String, Option<String>) {
    let mut url = settings.url.clone();
    if !settings.cache {
        url = encode::add_cache_buster(&url);
    }

    match &settings.payload {
        Some(payload) if settings.method == Method::GET => {
            url = encode::add_to_query_string(&url, payload.iter());
            (url, None)
        }
        Some(payload) => (url, Some(payload.to_query_string())),
        None => (url, None),
    }
}

impl<T: Transport> ClientInner<T> {
    fn prepare(
        &self,
        settings: &Settings,
        target: &str,
        body: Option<String>,
    ) -> Result<OutgoingRequest> {
        let url = match &self.base_url {
            Some(base) => base.join(target)?.to_string(),
            None => target.to_string(),
        };

        let mut headers = self.default_headers.clone();
        headers.insert(CONTENT_TYPE, header_value(&settings.content_type)?);
        if let Some(accept) = settings.accepts.get(settings.response_type) {
            headers.insert(ACCEPT, header_value(accept)?);
        }

        Ok(OutgoingRequest {
            method: settings.method.clone(),
            url,
            headers,
            body,
        })
    }

    async fn execute(&self, outgoing: Result<OutgoingRequest>, exchange: Exchange) {
        let result = match outgoing {
            Ok(request) => self.transport.send(request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => exchange.handle.resolve(response),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    method = %exchange.settings.method,
                    url = %exchange.handle.url(),
                    "Request failed before a response arrived"
                );
                exchange.handle.reject(e);
            }
        }

        exchange.complete();
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::try_from(value)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))
}

/// Everything completion handling needs, owned by one request.
struct Exchange {
    settings: Settings,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
    on_complete: Option<CompleteCallback>,
    handle: RequestHandle,
}

/// Marks the handle finished even if a callback panics.
struct FinishGuard(RequestHandle);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}

impl Exchange {
    fn complete(self) {
        let Exchange {
            settings,
            on_success,
            on_error,
            on_complete,
            handle,
        } = self;

        if !handle.claim_completion() {
            return;
        }
        let _guard = FinishGuard(handle.clone());
        let status = handle.status();

        match handle.response() {
            Some(response) if is_success_status(status) => {
                tracing::info!(
                    status = status,
                    latency_ms = response.latency.as_millis(),
                    "Received HTTP response"
                );

                let body = match ResponseBody::decode(response, settings.response_type) {
                    Ok(body) => body,
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            raw_response = %response.body,
                            response_type = %settings.response_type,
                            "Failed to decode response"
                        );
                        handle.set_decode_error(e);
                        return;
                    }
                };

                if let Some(on_success) = on_success {
                    on_success(&settings, body, status, &handle);
                }
            }
            response => {
                if let Some(response) = response {
                    if response.status.is_client_error() {
                        tracing::error!(
                            status = status,
                            response = %response.body,
                            "Client error (4xx)"
                        );
                    } else if response.status.is_server_error() {
                        tracing::warn!(
                            status = status,
                            response = %response.body,
                            "Server error (5xx)"
                        );
                    } else {
                        tracing::info!(status = status, "Unsuccessful HTTP response");
                    }
                }

                if let Some(on_error) = on_error {
                    on_error(&settings, &handle, status);
                }
            }
        }

        if let Some(on_complete) = on_complete {
            on_complete(&settings, &handle, status);
        }
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use xhrkit::ClientBuilder;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), xhrkit::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .timeout(Duration::from_secs(30))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the URL relative request URLs are resolved against.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header sent with every request.
    ///
    /// `Content-Type` and `Accept` set per request take precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = header_value(value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets a timeout on the default reqwest transport.
    ///
    /// Ignored by [`ClientBuilder::build_with`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds a client with the default reqwest transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn build(self) -> Result<Client> {
        let transport = HttpTransport::with_timeout(self.timeout)?;
        Ok(self.build_with(transport))
    }

    /// Builds a client around a custom transport.
    pub fn build_with<T: Transport>(self, transport: T) -> Client<T> {
        Client {
            inner: Arc::new(ClientInner {
                transport,
                base_url: self.base_url,
                default_headers: self.default_headers,
            }),
        }
    }
}
