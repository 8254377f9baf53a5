//! services/site/src/web/middleware.rs
//!
//! Session resolution, route guards and error page rendering.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use dealership_core::domain::Identity;
use std::sync::Arc;
use tracing::debug;

use crate::auth::SESSION_COOKIE;
use crate::web::context::{to_login, RequestContext};
use crate::web::cookies;
use crate::web::error::ErrorPage;
use crate::web::flash;
use crate::web::state::AppState;
use crate::web::view::View;

/// Verifies the session cookie on every request.
///
/// A valid token puts its [`Identity`] into the request extensions. A token
/// that fails verification is treated as absent and its cookie is cleared,
/// unless the handler already set a new one.
pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = cookies::read(req.headers(), SESSION_COOKIE).map(str::to_owned);
    let identity = token.as_deref().and_then(|t| state.sessions.verify(t));
    let stale = token.is_some() && identity.is_none();

    if let Some(identity) = identity {
        req.extensions_mut().insert(identity);
    }

    let mut res = next.run(req).await;

    if stale && !cookies::is_set(res.headers(), SESSION_COOKIE) {
        debug!("Clearing an invalid session cookie");
        if let Ok(value) = HeaderValue::from_str(&state.sessions.clear_cookie()) {
            res.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    res
}

/// Lets only signed-in callers through.
pub async fn require_login(req: Request, next: Next) -> Response {
    if req.extensions().get::<Identity>().is_none() {
        return to_login("Please log in.");
    }
    next.run(req).await
}

/// Lets only employees and admins through.
pub async fn require_staff(req: Request, next: Next) -> Response {
    match req.extensions().get::<Identity>() {
        Some(identity) if identity.account_type.is_staff() => next.run(req).await,
        Some(_) => to_login("Please log in with an employee or admin account."),
        None => to_login("Please log in."),
    }
}

/// Replaces the body of any response marked with [`ErrorPage`] by the rendered error view.
pub async fn render_error_pages(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext {
        identity: req.extensions().get::<Identity>().cloned(),
        flash: flash::pending(req.headers()),
    };

    let res = next.run(req).await;
    let Some(page) = res.extensions().get::<ErrorPage>().cloned() else {
        return res;
    };

    let view = View::new("errors/error", page.title.clone())
        .status(page.status)
        .data(serde_json::json!({ "message": page.message }));
    let mut rendered = state.page(&ctx, view);
    for cookie in res.headers().get_all(header::SET_COOKIE) {
        rendered.headers_mut().append(header::SET_COOKIE, cookie.clone());
    }
    rendered
}
