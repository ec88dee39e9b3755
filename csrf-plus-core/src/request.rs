//! Read-only view of an inbound request.
//!
//! The engine only needs a handful of request fields. Framework adapters
//! implement [`CsrfRequest`]; [`RequestInfo`] is an owned implementation for
//! hosts that already hold the raw pieces.

use crate::cookie::find_cookie;
use http::request::Parts;

/// Request fields consumed by token issuance and verification
pub trait CsrfRequest: Send + Sync {
    /// HTTP method, e.g. `POST`
    fn method(&self) -> &str;

    /// Request path without the query string
    fn path(&self) -> &str;

    /// Header value by name (case-insensitive)
    fn header(&self, name: &str) -> Option<&str>;

    /// Field from the parsed request body
    fn body_field(&self, name: &str) -> Option<String>;

    /// Parameter from the query string
    fn query_param(&self, name: &str) -> Option<String>;

    /// Request cookie by name
    fn cookie(&self, name: &str) -> Option<String>;

    /// Session identifier supplied by the host's own session layer
    fn session_id(&self) -> Option<&str> {
        None
    }

    /// The request's own authority, from the `Host` header
    fn host(&self) -> Option<&str> {
        self.header("host")
    }
}

/// Owned request data
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    /// Request method (GET, POST, etc.)
    pub method: String,
    /// Request path
    pub path: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    /// Request headers in arrival order
    pub headers: Vec<(String, String)>,
    /// Raw request body
    pub body: Vec<u8>,
    /// Externally managed session identifier
    pub session_id: Option<String>,
}

impl RequestInfo {
    /// Create a new request info
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Build from the head of an `http` request and its collected body
    pub fn from_parts(parts: &Parts, body: impl Into<Vec<u8>>) -> Self {
        let mut headers: Vec<(String, String)> = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        // HTTP/2 carries the host in `:authority`, which `http` keeps in the URI
        if !parts.headers.contains_key(http::header::HOST) {
            if let Some(authority) = parts.uri.authority() {
                headers.push(("host".to_string(), authority.as_str().to_string()));
            }
        }

        Self {
            method: parts.method.as_str().to_string(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers,
            body: body.into(),
            session_id: None,
        }
    }

    /// Set the query string
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the raw body
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Set an externally managed session identifier
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    fn form_field(encoded: &[u8], name: &str) -> Option<String> {
        serde_urlencoded::from_bytes::<Vec<(String, String)>>(encoded)
            .ok()?
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

impl CsrfRequest for RequestInfo {
    fn method(&self) -> &str {
        &self.method
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn body_field(&self, name: &str) -> Option<String> {
        if self.body.is_empty() {
            return None;
        }

        // JSON object bodies first, then urlencoded forms
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&self.body) {
            return json.get(name).and_then(|v| v.as_str()).map(str::to_string);
        }

        Self::form_field(&self.body, name)
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .as_deref()
            .and_then(|q| Self::form_field(q.as_bytes(), name))
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("cookie"))
            .find_map(|(_, v)| find_cookie(v, name))
            .map(str::to_string)
    }

    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = RequestInfo::new("POST", "/").with_header("X-CSRF-Plus", "token");
        assert_eq!(req.header("x-csrf-plus"), Some("token"));
        assert_eq!(req.header("X-CSRF-PLUS"), Some("token"));
        assert_eq!(req.header("x-other"), None);
    }

    #[test]
    fn test_body_field_json() {
        let req = RequestInfo::new("POST", "/").with_body(r#"{"_csrf":"abc","n":1}"#);
        assert_eq!(req.body_field("_csrf"), Some("abc".to_string()));
        assert_eq!(req.body_field("n"), None);
        assert_eq!(req.body_field("missing"), None);
    }

    #[test]
    fn test_body_field_form() {
        let req = RequestInfo::new("POST", "/").with_body("name=x&_csrf=a%2Db_c");
        assert_eq!(req.body_field("_csrf"), Some("a-b_c".to_string()));
    }

    #[test]
    fn test_empty_body() {
        let req = RequestInfo::new("POST", "/");
        assert_eq!(req.body_field("_csrf"), None);
    }

    #[test]
    fn test_query_param() {
        let req = RequestInfo::new("POST", "/submit").with_query("page=2&_csrf=tok");
        assert_eq!(req.query_param("_csrf"), Some("tok".to_string()));
        assert_eq!(req.query_param("other"), None);
    }

    #[test]
    fn test_cookies_across_headers() {
        let req = RequestInfo::new("POST", "/")
            .with_header("Cookie", "theme=dark")
            .with_header("cookie", "CSRF_PLUS_SID=s1; lang=en");
        assert_eq!(req.cookie("CSRF_PLUS_SID"), Some("s1".to_string()));
        assert_eq!(req.cookie("theme"), Some("dark".to_string()));
        assert_eq!(req.cookie("none"), None);
    }

    #[test]
    fn test_host_and_session_id() {
        let req = RequestInfo::new("POST", "/")
            .with_header("Host", "example.com:8080")
            .with_session_id("session-1");
        assert_eq!(req.host(), Some("example.com:8080"));
        assert_eq!(CsrfRequest::session_id(&req), Some("session-1"));
    }

    #[test]
    fn test_from_parts() {
        let (parts, body) = http::Request::builder()
            .method("PUT")
            .uri("https://example.com/items/7?_csrf=q")
            .header("x-csrf-plus", "h")
            .body(b"_csrf=b".to_vec())
            .unwrap()
            .into_parts();

        let req = RequestInfo::from_parts(&parts, body);
        assert_eq!(req.method(), "PUT");
        assert_eq!(req.path(), "/items/7");
        assert_eq!(req.query_param("_csrf"), Some("q".to_string()));
        assert_eq!(req.header("X-Csrf-Plus"), Some("h"));
        assert_eq!(req.body_field("_csrf"), Some("b".to_string()));
        assert_eq!(req.host(), Some("example.com"));
    }

    #[test]
    fn test_from_parts_prefers_host_header() {
        let (parts, _) = http::Request::builder()
            .uri("https://internal.local/submit")
            .header("host", "app.example.com")
            .body(())
            .unwrap()
            .into_parts();

        let req = RequestInfo::from_parts(&parts, Vec::new());
        assert_eq!(req.host(), Some("app.example.com"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn test_from_parts_relative_uri_without_host() {
        let (parts, _) = http::Request::builder()
            .uri("/submit")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(RequestInfo::from_parts(&parts, Vec::new()).host(), None);
    }

    #[tokio::test]
    async fn test_from_parts_authority_passes_origin_check() {
        use crate::{CsrfConfig, CsrfMiddleware, create_stateless_token};

        let key = b"test_secret_key_32_bytes_long!!!";
        let config = CsrfConfig::builder()
            .stateless(key.to_vec())
            .with_origin_check(true)
            .build()
            .unwrap();
        let middleware = CsrfMiddleware::new(config);
        let token = create_stateless_token(60_000, key).unwrap();

        let (parts, body) = http::Request::builder()
            .method("POST")
            .uri("https://app.example.com/submit")
            .header("origin", "https://app.example.com")
            .header("x-csrf-plus", token)
            .body(Vec::new())
            .unwrap()
            .into_parts();

        let req = RequestInfo::from_parts(&parts, body);
        assert_eq!(req.host(), Some("app.example.com"));
        assert_eq!(middleware.validate_request(&req).await, Ok(()));
    }
}
