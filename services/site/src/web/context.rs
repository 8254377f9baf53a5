//! services/site/src/web/context.rs
//!
//! Per-request extractors: who is calling and which flash notice is pending.

use axum::{
    extract::{rejection::PathRejection, FromRequestParts, Path},
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use dealership_core::domain::Identity;
use std::convert::Infallible;

use crate::web::error::AppError;
use crate::web::flash::{self, Notice};

pub const LOGIN_PATH: &str = "/account/login";

/// The identity resolved by the session middleware and the pending flash notice.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub identity: Option<Identity>,
    pub flash: Option<String>,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            identity: parts.extensions.get::<Identity>().cloned(),
            flash: flash::pending(&parts.headers),
        })
    }
}

/// The signed-in account. Rejects anonymous callers with a redirect to the login page.
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Identity);

impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentAccount)
            .ok_or_else(|| to_login("Please log in."))
    }
}

/// Redirects to the login page with a notice.
pub fn to_login(notice: &str) -> Response {
    (Notice::new(notice), Redirect::to(LOGIN_PATH)).into_response()
}

/// A numeric id from the path. Anything unparsable is a missing page.
pub fn path_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, AppError> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::NotFound(e.body_text()))
}
