//! Error types for dispatched requests.
//!
//! Outcomes of a request normally travel through the callbacks registered on
//! it. The errors here cover what cannot: transport failures, JSON bodies
//! that do not decode, and configuration mistakes.

use http::StatusCode;

/// The main error type.
///
/// # Examples
///
/// ```no_run
/// use xhrkit::{Client, Error, RequestOptions, ResponseType};
///
/// # async fn example() {
/// let client = Client::new();
/// let handle = client
///     .request(
///         RequestOptions::new()
///             .url("https://api.example.com/items")
///             .response_type(ResponseType::Json),
///     )
///     .await;
///
/// match handle.wait().await {
///     Ok(status) => println!("finished with status {}", status),
///     Err(Error::DeserializationFailed { raw_response, serde_error, .. }) => {
///         eprintln!("bad JSON ({}): {}", serde_error, raw_response);
///     }
///     Err(e) => eprintln!("request failed: {}", e),
/// }
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A network-level error occurred (connection failed, DNS lookup failed, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body was not valid JSON.
    ///
    /// The raw body is kept so the failure can be inspected after the fact.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Invalid configuration was provided, such as a bad header name or value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` when a JSON response body failed to decode.
    ///
    /// ```
    /// use http::StatusCode;
    /// use xhrkit::Error;
    ///
    /// let err = Error::DeserializationFailed {
    ///     raw_response: "{".to_string(),
    ///     serde_error: "EOF while parsing an object".to_string(),
    ///     status: StatusCode::OK,
    /// };
    /// assert!(err.is_decode());
    /// assert!(!Error::ConfigurationError("bad".into()).is_decode());
    /// ```
    pub fn is_decode(&self) -> bool {
        matches!(self, Error::DeserializationFailed { .. })
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::DeserializationFailed { status, .. } => Some(*status),
            Error::Network(e) => e.status(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
