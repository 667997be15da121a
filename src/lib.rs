//! # xhrkit - a small HTTP request helper
//!
//! xhrkit wraps one request primitive with ergonomic defaults: a partial
//! configuration is merged over fixed defaults, the payload is encoded into
//! the query string or the body, the response is decoded as text, HTML, JSON
//! or XML, and up to three callbacks report the outcome.
//!
//! ## Quick Start
//!
//! ```no_run
//! use xhrkit::{Client, Payload, RequestOptions, ResponseType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), xhrkit::Error> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")?
//!         .build()?;
//!
//!     let handle = client
//!         .request(
//!             RequestOptions::new()
//!                 .url("/users")
//!                 .payload(Payload::new().with("page", 2))
//!                 .response_type(ResponseType::Json)
//!                 .cache(false)
//!                 .on_success(|_settings, body, status, _handle| {
//!                     println!("{}: {:?}", status, body.as_json());
//!                 })
//!                 .on_error(|_settings, handle, status| {
//!                     eprintln!("{} answered {}", handle.url(), status);
//!                 })
//!                 .on_complete(|_settings, _handle, _status| println!("done")),
//!         )
//!         .await;
//!
//!     // Asynchronous requests run in the background; wait for the callbacks.
//!     handle.wait().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Defaults
//!
//! | option          | default                              |
//! |-----------------|--------------------------------------|
//! | `method`        | `GET`                                |
//! | `response_type` | `text`                               |
//! | `is_async`      | `true`                               |
//! | `cache`         | `true`                               |
//! | `content_type`  | `application/x-www-form-urlencoded`  |
//! | `accepts`       | see [`Accepts`]                      |
//!
//! ## Outcomes
//!
//! Statuses in `200..300` and `304` are successes: the body is decoded and
//! passed to `on_success`. Anything else, including a request that never got
//! a response (status `0`), goes to `on_error`. `on_complete` runs after
//! either. A body that does not decode as the requested JSON is fatal for
//! the request: no further callback runs and [`RequestHandle::wait`] returns
//! the error. An XML body that does not parse decodes to `Xml(None)`.
//!
//! ## Loading content
//!
//! [`Client::load_into`] fetches HTML and puts it into an element of a
//! [`dom::Document`]. [`dom::memory::MemoryDocument`] is an in-memory one.

use std::sync::{Arc, OnceLock};

pub mod callback;
mod client;
mod config;
pub mod dom;
pub mod encode;
mod error;
mod handle;
mod loader;
mod response;
pub mod transport;
mod xml;

pub use callback::{CompleteCallback, ErrorCallback, SuccessCallback};
pub use client::{Client, ClientBuilder};
pub use config::{
    Accepts, Payload, RequestConfig, RequestOptions, ResponseType, Settings, DEFAULT_CONTENT_TYPE,
};
pub use error::{Error, Result};
pub use handle::{ReadyState, RequestHandle};
pub use response::{is_success_status, parse_json, RawResponse, ResponseBody};
pub use transport::{HttpTransport, Transport};
pub use xml::{XmlDocument, XmlElement, XmlNode};

/// The process-wide client behind the free functions of this crate.
///
/// Created on first use with [`Client::new`] and never changed afterwards.
pub fn default_client() -> &'static Client {
    static DEFAULT_CLIENT: OnceLock<Client> = OnceLock::new();
    DEFAULT_CLIENT.get_or_init(Client::new)
}

/// Dispatches a request with the [`default_client`].
pub async fn request(options: RequestOptions) -> RequestHandle {
    default_client().request(options).await
}

/// Dispatches a GET request with the [`default_client`].
pub async fn get(
    url: impl Into<String>,
    payload: Option<Payload>,
    on_success: Option<SuccessCallback>,
) -> RequestHandle {
    default_client().get(url, payload, on_success).await
}

/// Dispatches a POST request with the [`default_client`].
pub async fn post(
    url: impl Into<String>,
    payload: Option<Payload>,
    on_success: Option<SuccessCallback>,
) -> RequestHandle {
    default_client().post(url, payload, on_success).await
}

/// Loads HTML into a document element with the [`default_client`].
pub async fn load_into<D: dom::Document>(
    document: Arc<D>,
    target: impl Into<dom::Target<D::Node>>,
    url: impl Into<String>,
    payload: Option<Payload>,
    on_complete: Option<CompleteCallback>,
) -> RequestHandle {
    default_client()
        .load_into(document, target, url, payload, on_complete)
        .await
}
