//! Request configuration, defaults, and the merge between them.
//!
//! Callers describe a request with [`RequestOptions`], where every field is
//! optional. Before anything is sent the options are merged against
//! [`RequestConfig::defaults`] into a total [`RequestConfig`].

use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::callback::{CompleteCallback, ErrorCallback, SuccessCallback};
use crate::{Error, Result};

/// Content type sent when the caller does not choose one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// How the response body is decoded before it reaches the success callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Raw text.
    #[default]
    Text,
    /// Raw text, intended for insertion into a document.
    Html,
    /// Parsed JSON.
    Json,
    /// Parsed XML document.
    Xml,
}

impl ResponseType {
    /// Lowercase name of the response type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Text => "text",
            ResponseType::Html => "html",
            ResponseType::Json => "json",
            ResponseType::Xml => "xml",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from response type to the `Accept` header sent for it.
///
/// A response type without an entry sends no `Accept` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accepts {
    pub text: Option<String>,
    pub html: Option<String>,
    pub xml: Option<String>,
    pub json: Option<String>,
}

impl Accepts {
    /// An empty mapping: no `Accept` header for any response type.
    pub fn none() -> Self {
        Self {
            text: None,
            html: None,
            xml: None,
            json: None,
        }
    }

    /// Returns the `Accept` value for a response type.
    pub fn get(&self, response_type: ResponseType) -> Option<&str> {
        match response_type {
            ResponseType::Text => self.text.as_deref(),
            ResponseType::Html => self.html.as_deref(),
            ResponseType::Xml => self.xml.as_deref(),
            ResponseType::Json => self.json.as_deref(),
        }
    }

    /// Sets the `Accept` value for a response type.
    pub fn with(mut self, response_type: ResponseType, value: impl Into<String>) -> Self {
        let slot = match response_type {
            ResponseType::Text => &mut self.text,
            ResponseType::Html => &mut self.html,
            ResponseType::Xml => &mut self.xml,
            ResponseType::Json => &mut self.json,
        };
        *slot = Some(value.into());
        self
    }
}

impl Default for Accepts {
    fn default() -> Self {
        Self {
            text: Some("text/plain".to_string()),
            html: Some("text/html".to_string()),
            xml: Some("application/xml, text/xml".to_string()),
            json: Some("application/json, text/javascript".to_string()),
        }
    }
}

/// An ordered mapping of keys to scalar values, sent as a query string or
/// form body.
///
/// Pairs keep their insertion order. Inserting an existing key replaces its
/// value in place.
///
/// # Examples
///
/// ```
/// use xhrkit::Payload;
///
/// let payload = Payload::new().with("q", "rust lang").with("page", 2);
/// assert_eq!(payload.to_query_string(), "q=rust%20lang&page=2");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pairs: Vec<(String, String)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair, replacing the value of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    /// Builder form of [`Payload::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Builds a payload from any value that serializes to a flat JSON object.
    ///
    /// Strings are used verbatim, other scalars through their JSON text, and
    /// `null` becomes the string `null`. Nested arrays or objects are rejected.
    /// Keys come out in the order `serde_json` stores them (sorted).
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the value is not a flat object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_value(value)
            .map_err(|e| Error::ConfigurationError(format!("Invalid payload: {}", e)))?;
        let serde_json::Value::Object(map) = json else {
            return Err(Error::ConfigurationError(
                "Payload must serialize to an object".to_string(),
            ));
        };

        let mut payload = Payload::new();
        for (key, value) in map {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                    return Err(Error::ConfigurationError(format!(
                        "Payload value for `{}` is not a scalar",
                        key
                    )));
                }
                scalar => scalar.to_string(),
            };
            payload.insert(key, value);
        }
        Ok(payload)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Percent-encodes the pairs as `key=value&...`.
    pub fn to_query_string(&self) -> String {
        crate::encode::param(self.iter())
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Payload::new();
        for (k, v) in iter {
            payload.insert(k, v);
        }
        payload
    }
}

/// The non-callback part of a merged configuration.
///
/// Every callback receives the settings of the request it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub url: String,
    pub method: Method,
    pub response_type: ResponseType,
    pub is_async: bool,
    pub cache: bool,
    pub payload: Option<Payload>,
    pub content_type: String,
    pub accepts: Accepts,
}

/// A fully merged request configuration.
///
/// Every field has a value; see [`RequestConfig::defaults`] for the values
/// used when the caller leaves a field out.
pub struct RequestConfig {
    pub settings: Settings,
    pub on_success: Option<SuccessCallback>,
    pub on_error: Option<ErrorCallback>,
    pub on_complete: Option<CompleteCallback>,
}

impl RequestConfig {
    /// The default configuration.
    ///
    /// ```
    /// use http::Method;
    /// use xhrkit::{RequestConfig, ResponseType};
    ///
    /// let defaults = RequestConfig::defaults();
    /// assert_eq!(defaults.settings.method, Method::GET);
    /// assert_eq!(defaults.settings.response_type, ResponseType::Text);
    /// assert!(defaults.settings.is_async);
    /// assert!(defaults.settings.cache);
    /// assert_eq!(defaults.settings.content_type, "application/x-www-form-urlencoded");
    /// ```
    pub fn defaults() -> Self {
        Self {
            settings: Settings {
                url: String::new(),
                method: Method::GET,
                response_type: ResponseType::Text,
                is_async: true,
                cache: true,
                payload: None,
                content_type: DEFAULT_CONTENT_TYPE.to_string(),
                accepts: Accepts::default(),
            },
            on_success: None,
            on_error: None,
            on_complete: None,
        }
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("settings", &self.settings)
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// A partial request configuration.
///
/// Fields left unset take their default when the request is dispatched.
/// Setting a field, even to `false` or to an empty value, always wins over
/// the default.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use xhrkit::{Payload, RequestOptions, ResponseType};
///
/// let config = RequestOptions::new()
///     .url("/search")
///     .method(Method::POST)
///     .response_type(ResponseType::Json)
///     .cache(false)
///     .payload(Payload::new().with("q", "rust"))
///     .merge();
///
/// assert_eq!(config.settings.method, Method::POST);
/// assert!(!config.settings.cache);
/// assert!(config.settings.is_async);
/// ```
#[derive(Default)]
pub struct RequestOptions {
    pub url: Option<String>,
    pub method: Option<Method>,
    pub response_type: Option<ResponseType>,
    pub is_async: Option<bool>,
    pub cache: Option<bool>,
    pub payload: Option<Option<Payload>>,
    pub content_type: Option<String>,
    pub accepts: Option<Accepts>,
    pub on_success: Option<Option<SuccessCallback>>,
    pub on_error: Option<Option<ErrorCallback>>,
    pub on_complete: Option<Option<CompleteCallback>>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    /// Chooses between asynchronous (`true`) and synchronous dispatch.
    ///
    /// A synchronous request runs its callbacks before
    /// [`Client::request`](crate::Client::request) returns.
    pub fn is_async(mut self, is_async: bool) -> Self {
        self.is_async = Some(is_async);
        self
    }

    /// Allows (`true`) or defeats (`false`) caching with a `noAjaxCache` parameter.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn payload(mut self, payload: impl Into<Option<Payload>>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn accepts(mut self, accepts: Accepts) -> Self {
        self.accepts = Some(accepts);
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Settings, crate::ResponseBody, u16, &crate::RequestHandle) + Send + 'static,
    {
        self.on_success = Some(Some(Box::new(f)));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Settings, &crate::RequestHandle, u16) + Send + 'static,
    {
        self.on_error = Some(Some(Box::new(f)));
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Settings, &crate::RequestHandle, u16) + Send + 'static,
    {
        self.on_complete = Some(Some(Box::new(f)));
        self
    }

    /// Merges these options over [`RequestConfig::defaults`].
    pub fn merge(self) -> RequestConfig {
        let defaults = RequestConfig::defaults();
        let d = defaults.settings;

        RequestConfig {
            settings: Settings {
                url: self.url.unwrap_or(d.url),
                method: self.method.unwrap_or(d.method),
                response_type: self.response_type.unwrap_or(d.response_type),
                is_async: self.is_async.unwrap_or(d.is_async),
                cache: self.cache.unwrap_or(d.cache),
                payload: self.payload.unwrap_or(d.payload),
                content_type: self.content_type.unwrap_or(d.content_type),
                accepts: self.accepts.unwrap_or(d.accepts),
            },
            on_success: self.on_success.unwrap_or(defaults.on_success),
            on_error: self.on_error.unwrap_or(defaults.on_error),
            on_complete: self.on_complete.unwrap_or(defaults.on_complete),
        }
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("response_type", &self.response_type)
            .field("is_async", &self.is_async)
            .field("cache", &self.cache)
            .field("payload", &self.payload)
            .field("content_type", &self.content_type)
            .field("accepts", &self.accepts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_options_take_every_default() {
        let config = RequestOptions::new().merge();
        let defaults = RequestConfig::defaults();

        assert_eq!(config.settings, defaults.settings);
        assert!(config.on_success.is_none());
        assert!(config.on_error.is_none());
        assert!(config.on_complete.is_none());
    }

    #[test]
    fn test_explicit_false_values_are_preserved() {
        let config = RequestOptions::new().is_async(false).cache(false).merge();

        assert!(!config.settings.is_async);
        assert!(!config.settings.cache);
        assert_eq!(config.settings.method, Method::GET);
        assert_eq!(config.settings.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn test_explicit_empty_values_are_preserved() {
        let config = RequestOptions::new()
            .content_type("")
            .accepts(Accepts::none())
            .payload(None)
            .merge();

        assert_eq!(config.settings.content_type, "");
        assert_eq!(config.settings.accepts, Accepts::none());
        assert!(config.settings.payload.is_none());
    }

    #[test]
    fn test_callbacks_survive_merge() {
        let config = RequestOptions::new()
            .on_complete(|_, _, _| {})
            .merge();

        assert!(config.on_complete.is_some());
        assert!(config.on_success.is_none());
    }

    #[test]
    fn test_accepts_mapping() {
        let accepts = Accepts::default();
        assert_eq!(accepts.get(ResponseType::Text), Some("text/plain"));
        assert_eq!(accepts.get(ResponseType::Html), Some("text/html"));
        assert_eq!(accepts.get(ResponseType::Xml), Some("application/xml, text/xml"));
        assert_eq!(
            accepts.get(ResponseType::Json),
            Some("application/json, text/javascript")
        );

        let custom = Accepts::none().with(ResponseType::Json, "application/vnd.api+json");
        assert_eq!(custom.get(ResponseType::Json), Some("application/vnd.api+json"));
        assert_eq!(custom.get(ResponseType::Text), None);
    }

    #[test]
    fn test_payload_keeps_insertion_order() {
        let payload = Payload::new().with("z", 1).with("a", 2).with("z", 3);

        let pairs: Vec<_> = payload.iter().collect();
        assert_eq!(pairs, vec![("z", "3"), ("a", "2")]);
        assert_eq!(payload.get("a"), Some("2"));
    }

    #[test]
    fn test_payload_from_serialize() {
        #[derive(Serialize)]
        struct Form {
            name: String,
            age: u32,
            admin: bool,
        }

        let payload = Payload::from_serialize(&Form {
            name: "Ada".to_string(),
            age: 36,
            admin: false,
        })
        .unwrap();

        assert_eq!(payload.get("name"), Some("Ada"));
        assert_eq!(payload.get("age"), Some("36"));
        assert_eq!(payload.get("admin"), Some("false"));
    }

    #[test]
    fn test_payload_from_serialize_rejects_nested_values() {
        let nested = serde_json::json!({ "tags": ["a", "b"] });
        assert!(matches!(
            Payload::from_serialize(&nested),
            Err(Error::ConfigurationError(_))
        ));
        assert!(Payload::from_serialize(&42).is_err());
    }

    #[test]
    fn test_response_type_serde_names() {
        let parsed: ResponseType = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(parsed, ResponseType::Json);
        assert_eq!(ResponseType::Xml.to_string(), "xml");
    }
}
