//! Case-insensitive response header map
//!
//! HTTP header names are case-insensitive, but the evaluation endpoint's
//! responses have been observed with varying casings across server versions.
//! This map lowercases names on insertion and exposes typed accessors for the
//! handful of headers this library actually reads.

use std::collections::HashMap;

/// Case-insensitive header map for a single HTTP response
#[derive(Clone, Debug, Default)]
pub struct ResponseHeaders {
    inner: HashMap<String, String>,
}

impl ResponseHeaders {
    /// Create an empty header map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, lowercasing the name
    ///
    /// Later insertions under the same name replace earlier ones; the
    /// endpoint does not emit repeated headers this library cares about.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.inner.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Look up a header by name, case-insensitively
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The `Content-Type` header, or empty when absent
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.get("content-type").unwrap_or("")
    }

    /// The `WWW-Authenticate` challenge header, if present
    #[must_use]
    pub fn www_authenticate(&self) -> Option<&str> {
        self.get("www-authenticate")
    }

    /// The `X-Primitive` header, or empty when absent
    #[must_use]
    pub fn primitive(&self) -> &str {
        self.get("x-primitive").unwrap_or("")
    }

    /// The `X-URI` header, or empty when absent
    #[must_use]
    pub fn uri(&self) -> &str {
        self.get("x-uri").unwrap_or("")
    }

    /// The `X-Path` header, or empty when absent
    #[must_use]
    pub fn path(&self) -> &str {
        self.get("x-path").unwrap_or("")
    }

    /// Number of headers in the map
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the map is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<&reqwest::header::HeaderMap> for ResponseHeaders {
    fn from(headers: &reqwest::header::HeaderMap) -> Self {
        let mut map = Self::new();
        for (name, value) in headers {
            if let Ok(value) = value.to_str() {
                map.insert(name.as_str(), value);
            }
        }
        map
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut headers = ResponseHeaders::new();
        headers.insert("Content-Type", "multipart/mixed; boundary=abc");

        assert_eq!(
            headers.get("content-type"),
            Some("multipart/mixed; boundary=abc")
        );
        assert_eq!(
            headers.get("CONTENT-TYPE"),
            Some("multipart/mixed; boundary=abc")
        );
    }

    #[test]
    fn typed_accessors_default_to_empty() {
        let headers = ResponseHeaders::new();
        assert_eq!(headers.content_type(), "");
        assert_eq!(headers.primitive(), "");
        assert_eq!(headers.uri(), "");
        assert_eq!(headers.path(), "");
        assert!(headers.www_authenticate().is_none());
    }

    #[test]
    fn typed_accessors_read_mixed_case_names() {
        let mut headers = ResponseHeaders::new();
        headers.insert("X-Primitive", "element()");
        headers.insert("x-uri", "/docs/a.xml");
        headers.insert("X-PATH", "/root/a");
        headers.insert("WWW-Authenticate", "Digest realm=\"public\"");

        assert_eq!(headers.primitive(), "element()");
        assert_eq!(headers.uri(), "/docs/a.xml");
        assert_eq!(headers.path(), "/root/a");
        assert_eq!(
            headers.www_authenticate(),
            Some("Digest realm=\"public\"")
        );
    }

    #[test]
    fn later_insertion_replaces_earlier() {
        let mut headers = ResponseHeaders::new();
        headers.insert("X-Primitive", "string");
        headers.insert("x-primitive", "decimal");

        assert_eq!(headers.primitive(), "decimal");
        assert_eq!(headers.len(), 1);
    }
}
