//! services/site/src/web/state.rs
//!
//! Defines the application's shared state and page rendering.

use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use dealership_core::ports::DatabaseService;
use std::sync::Arc;
use tracing::error;

use crate::auth::{Passwords, SessionKeys};
use crate::web::context::RequestContext;
use crate::web::error::ErrorPage;
use crate::web::flash;
use crate::web::view::{View, ViewRenderer};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub views: Arc<dyn ViewRenderer>,
    pub passwords: Passwords,
    pub sessions: SessionKeys,
}

impl AppState {
    /// Renders `view` for the current caller.
    ///
    /// A pending flash notice is shown first and its cookie is cleared on this
    /// response, so it appears exactly once.
    pub fn page(&self, ctx: &RequestContext, mut view: View) -> Response {
        view.account = ctx.identity.clone();
        if let Some(notice) = &ctx.flash {
            view.notices.insert(0, notice.clone());
        }

        let body = match self.views.render(&view) {
            Ok(body) => body,
            Err(e) => {
                error!("{}", e);
                return ErrorPage::crash().fallback();
            }
        };

        let mut res = (
            view.status,
            [(header::CONTENT_TYPE, self.views.content_type())],
            body,
        )
            .into_response();
        if ctx.flash.is_some() {
            if let Ok(value) = HeaderValue::from_str(&flash::clear_cookie()) {
                res.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        res
    }
}
