//! services/site/src/web/error.rs
//!
//! Request-level failures and how they become error pages.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dealership_core::ports::PortError;
use std::any::Any;
use tracing::{error, warn};

use crate::auth::{PasswordError, TokenError};

pub const NOT_FOUND_MESSAGE: &str = "Sorry, we appear to have lost that page.";
pub const CRASH_MESSAGE: &str = "Oh no! There was a crash. Maybe try a different route?";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] PortError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Marks a response whose body should be replaced by the rendered error page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub title: String,
    pub message: &'static str,
}

impl ErrorPage {
    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            title: StatusCode::NOT_FOUND.as_u16().to_string(),
            message: NOT_FOUND_MESSAGE,
        }
    }

    pub fn crash() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            title: "Server Error".to_string(),
            message: CRASH_MESSAGE,
        }
    }

    /// Plain-text rendition, used until the error page middleware replaces it.
    pub fn fallback(&self) -> Response {
        let mut res = (self.status, self.message).into_response();
        res.extensions_mut().insert(self.clone());
        res
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let page = match &self {
            AppError::NotFound(what) => {
                warn!("Not found: {}", what);
                ErrorPage::not_found()
            }
            AppError::Store(PortError::NotFound(what)) => {
                warn!("Not found in store: {}", what);
                ErrorPage::not_found()
            }
            other => {
                error!("Request failed: {}", other);
                ErrorPage::crash()
            }
        };
        page.fallback()
    }
}

/// Turns a handler panic into the crash page.
pub fn panic_page(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Handler panicked: {}", detail);
    ErrorPage::crash().fallback()
}
