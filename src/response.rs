//! Raw responses and body decoding.
//!
//! A [`RawResponse`] is what a transport hands back. Once the request is
//! classified as a success, its body is decoded into a [`ResponseBody`]
//! according to the request's [`ResponseType`].

use http::{HeaderMap, StatusCode};
use std::time::Duration;

use crate::{Error, ResponseType, Result, XmlDocument};

/// A response as returned by a transport.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The response body as text.
    pub body: String,

    /// Time from sending the request to receiving the full body.
    pub latency: Duration,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: String, latency: Duration) -> Self {
        Self {
            status,
            headers,
            body,
            latency,
        }
    }

    /// Returns a header value by name.
    ///
    /// ```
    /// # use xhrkit::RawResponse;
    /// # use http::{HeaderMap, HeaderValue, StatusCode};
    /// # use std::time::Duration;
    /// let mut headers = HeaderMap::new();
    /// headers.insert("content-type", HeaderValue::from_static("text/html"));
    /// let response = RawResponse::new(StatusCode::OK, headers, String::new(), Duration::ZERO);
    ///
    /// assert_eq!(response.header("content-type"), Some("text/html"));
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Returns `true` for statuses handled as success: 2xx and 304.
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status) || status == 304
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Text(String),
    Html(String),
    Json(serde_json::Value),
    /// `None` when the body was empty or not well-formed XML.
    Xml(Option<XmlDocument>),
}

impl ResponseBody {
    /// Decodes a raw response for the given response type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeserializationFailed`] for malformed JSON. XML never
    /// fails: a body that does not parse decodes to `Xml(None)`.
    pub fn decode(response: &RawResponse, response_type: ResponseType) -> Result<Self> {
        match response_type {
            ResponseType::Text => Ok(ResponseBody::Text(response.body.clone())),
            ResponseType::Html => Ok(ResponseBody::Html(response.body.clone())),
            ResponseType::Json => parse_json(&response.body)
                .map(ResponseBody::Json)
                .map_err(|e| Error::DeserializationFailed {
                    raw_response: response.body.clone(),
                    serde_error: e.to_string(),
                    status: response.status,
                }),
            ResponseType::Xml => match XmlDocument::parse(&response.body) {
                Ok(doc) => Ok(ResponseBody::Xml(Some(doc))),
                Err(message) => {
                    if !response.body.is_empty() {
                        tracing::warn!(
                            "XML response (status {}) did not parse: {}",
                            response.status,
                            message
                        );
                    }
                    Ok(ResponseBody::Xml(None))
                }
            },
        }
    }

    /// The text of a `Text` or `Html` body.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) | ResponseBody::Html(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlDocument> {
        match self {
            ResponseBody::Xml(doc) => doc.as_ref(),
            _ => None,
        }
    }

    /// Deserializes a `Json` body into a concrete type.
    ///
    /// ```
    /// use serde::Deserialize;
    /// use xhrkit::ResponseBody;
    ///
    /// #[derive(Deserialize)]
    /// struct Item { id: u32 }
    ///
    /// let body = ResponseBody::Json(serde_json::json!({ "id": 3 }));
    /// let item: Item = body.deserialize().unwrap();
    /// assert_eq!(item.id, 3);
    /// ```
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        match self {
            ResponseBody::Json(v) => T::deserialize(v),
            ResponseBody::Text(s) | ResponseBody::Html(s) => serde_json::from_str(s),
            ResponseBody::Xml(_) => Err(serde::de::Error::custom(
                "an XML body cannot be deserialized as JSON",
            )),
        }
    }
}

/// Parses JSON text strictly.
///
/// Surrounding whitespace is ignored. An empty text yields `null`; text made
/// only of whitespace is an error.
///
/// ```
/// use xhrkit::parse_json;
///
/// assert_eq!(parse_json(" {\"a\": 1} ").unwrap(), serde_json::json!({ "a": 1 }));
/// assert_eq!(parse_json("").unwrap(), serde_json::Value::Null);
/// assert!(parse_json("  ").is_err());
/// assert!(parse_json("alert(1)").is_err());
/// ```
pub fn parse_json(text: &str) -> serde_json::Result<serde_json::Value> {
    if text.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(text.trim())
}
