//! services/site/src/web/flash.rs
//!
//! One-shot notices carried across a redirect in the `flash` cookie.
//! The next rendered page shows the notice and clears the cookie.

use axum::http::HeaderMap;
use axum::response::{IntoResponseParts, ResponseParts};
use std::convert::Infallible;
use url::form_urlencoded;

use crate::web::cookies::{self, SetCookie};

pub const FLASH_COOKIE: &str = "flash";

/// A notice to show on the next rendered page.
///
/// Used as a response part: `(Notice::new("Message sent."), Redirect::to("/message/"))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(String);

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }

    fn cookie(&self) -> String {
        let encoded: String = form_urlencoded::byte_serialize(self.0.as_bytes()).collect();
        cookies::build(FLASH_COOKIE, &encoded, None, false)
    }
}

impl IntoResponseParts for Notice {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        SetCookie(self.cookie()).into_response_parts(res)
    }
}

/// The pending notice sent back by the browser, if any.
pub fn pending(headers: &HeaderMap) -> Option<String> {
    let raw = cookies::read(headers, FLASH_COOKIE)?;
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(message, _)| message.into_owned())
        .filter(|message| !message.is_empty())
}

pub fn clear_cookie() -> String {
    cookies::expire(FLASH_COOKIE, false)
}
