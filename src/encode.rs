//! Query-string encoding and URL helpers.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::time::{SystemTime, UNIX_EPOCH};

/// Query parameter appended when caching is disabled.
pub const CACHE_BUSTER_KEY: &str = "noAjaxCache";

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a single URI component.
///
/// ```
/// assert_eq!(xhrkit::encode::encode_component("a b&c=d/é"), "a%20b%26c%3Dd%2F%C3%A9");
/// assert_eq!(xhrkit::encode::encode_component("it's(ok)!"), "it's(ok)!");
/// ```
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Encodes pairs as `key=value` joined by `&`, in iteration order.
pub fn param<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Appends encoded pairs to a URL, using `&` if it already has a `?`.
///
/// ```
/// use xhrkit::encode::add_to_query_string;
///
/// assert_eq!(add_to_query_string("/a", [("x", "1")]), "/a?x=1");
/// assert_eq!(add_to_query_string("/a?y=2", [("x", "1")]), "/a?y=2&x=1");
/// ```
pub fn add_to_query_string<'a>(
    url: &str,
    pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", url, separator, param(pairs))
}

/// Appends the cache-busting parameter with the current time in milliseconds.
pub fn add_cache_buster(url: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
        .to_string();
    add_to_query_string(url, [(CACHE_BUSTER_KEY, millis.as_str())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_joins_in_order() {
        let encoded = param([("b", "2"), ("a", "1"), ("c", "")]);
        assert_eq!(encoded, "b=2&a=1&c=");
    }

    #[test]
    fn test_param_encodes_keys_and_values() {
        let encoded = param([("first name", "Ada & co"), ("x+y", "100%")]);
        assert_eq!(encoded, "first%20name=Ada%20%26%20co&x%2By=100%25");
    }

    #[test]
    fn test_param_empty() {
        assert_eq!(param(std::iter::empty()), "");
    }

    #[test]
    fn test_cache_buster_appended() {
        let url = add_cache_buster("/items?page=1");
        let (base, millis) = url.split_once("&noAjaxCache=").unwrap();

        assert_eq!(base, "/items?page=1");
        assert!(millis.parse::<u128>().unwrap() > 0);
    }
}
