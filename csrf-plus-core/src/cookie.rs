//! Cookie rendering and parsing.

use crate::config::SameSite;
use crate::error::CookieError;
use http::header::{HeaderMap, HeaderValue, SET_COOKIE};

/// Attributes attached to a rendered `Set-Cookie` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    /// Lifetime in seconds; session cookie when `None`
    pub max_age: Option<u64>,
}

impl Default for CookieAttributes {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            domain: None,
            secure: true,
            http_only: false,
            same_site: SameSite::Lax,
            max_age: None,
        }
    }
}

/// Render a `Set-Cookie` header value
pub fn render_set_cookie(name: &str, value: &str, attrs: &CookieAttributes) -> String {
    let mut cookie = format!("{}={}; Path={}", name, value, attrs.path);

    if let Some(ref domain) = attrs.domain {
        cookie.push_str(&format!("; Domain={}", domain));
    }

    if let Some(max_age) = attrs.max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age));
    }

    if attrs.secure {
        cookie.push_str("; Secure");
    }

    if attrs.http_only {
        cookie.push_str("; HttpOnly");
    }

    cookie.push_str(&format!("; SameSite={}", attrs.same_site.as_str()));
    cookie
}

/// Find a cookie by name in a `Cookie` request header value
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(n, _)| n.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"'))
}

/// Destination for `Set-Cookie` values on an outgoing response
pub trait CookieSink {
    fn append_set_cookie(&mut self, value: String) -> Result<(), CookieError>;
}

impl CookieSink for HeaderMap {
    fn append_set_cookie(&mut self, value: String) -> Result<(), CookieError> {
        let value = HeaderValue::from_str(&value)?;
        self.append(SET_COOKIE, value);
        Ok(())
    }
}

impl CookieSink for Vec<String> {
    fn append_set_cookie(&mut self, value: String) -> Result<(), CookieError> {
        self.push(value);
        Ok(())
    }
}
