//! services/site/src/web/cookies.rs
//!
//! Minimal cookie header helpers.

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use std::convert::Infallible;
use std::time::Duration;
use tracing::error;

/// A `Set-Cookie` header used as a response part. Appends, so several
/// cookies can be set on one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie(pub String);

impl IntoResponseParts for SetCookie {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        match HeaderValue::from_str(&self.0) {
            Ok(value) => {
                res.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("Dropped an invalid Set-Cookie header: {}", e),
        }
        Ok(res)
    }
}

/// Builds a `Set-Cookie` value. Every cookie the site sets is HTTP-only.
pub fn build(name: &str, value: &str, max_age: Option<Duration>, secure: bool) -> String {
    let mut cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", name, value);
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age.as_secs()));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// A `Set-Cookie` value that removes the cookie from the browser.
pub fn expire(name: &str, secure: bool) -> String {
    build(name, "", Some(Duration::ZERO), secure)
}

/// Reads a non-empty cookie value from the request headers.
pub fn read<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|h| h.split(';'))
        .find_map(|c| c.trim().strip_prefix(name)?.strip_prefix('='))
        .filter(|v| !v.is_empty())
}

/// True when the response headers already set (or clear) the named cookie.
pub fn is_set(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.strip_prefix(name).is_some_and(|rest| rest.starts_with('=')))
}
