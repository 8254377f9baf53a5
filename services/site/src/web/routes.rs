//! services/site/src/web/routes.rs
//!
//! Builds the complete router: public pages, signed-in pages, staff pages,
//! the error boundary and the API docs.

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::{from_fn, from_fn_with_state},
    response::Response,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info_span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::web::context::RequestContext;
use crate::web::doc::ApiDoc;
use crate::web::error::{panic_page, AppError};
use crate::web::middleware::{render_error_pages, require_login, require_staff, resolve_identity};
use crate::web::state::AppState;
use crate::web::view::View;
use crate::web::{account, inventory, message};

/// The home page.
pub async fn home(State(state): State<Arc<AppState>>, ctx: RequestContext) -> Result<Response, AppError> {
    let classifications = state.db.list_classifications().await?;
    let view = View::new("index", "Home").data(json!({ "classifications": classifications }));
    Ok(state.page(&ctx, view))
}

pub async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.to_string())
}

pub fn router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/", get(home))
        .route(
            "/account/login",
            get(account::login_form).post(account::login),
        )
        .route(
            "/account/register",
            get(account::register_form).post(account::register),
        )
        .route(
            "/account/logout",
            get(account::logout).post(account::logout),
        )
        .route(
            "/inv/type/{classification_id}",
            get(inventory::by_classification),
        )
        .route("/inv/detail/{inv_id}", get(inventory::vehicle_detail));

    let signed_in = Router::new()
        .route("/account", get(account::account_home))
        .route("/account/", get(account::account_home))
        .route("/account/edit-account", get(account::edit_account_form))
        .route("/account/update", post(account::update_account))
        .route("/account/update/password", post(account::update_password))
        .route("/message", get(message::inbox))
        .route("/message/", get(message::inbox))
        .route(
            "/message/archive",
            get(message::archive).post(message::archive_message),
        )
        .route(
            "/message/createMessage",
            get(message::create_message_form).post(message::create_message),
        )
        .route("/message/detail/{message_id}", get(message::message_detail))
        .route("/message/reply", post(message::reply_form))
        .route("/message/replyMessage", post(message::reply_message))
        .route("/message/read", post(message::mark_read))
        .route("/message/unread", post(message::mark_unread))
        .route("/message/delete", post(message::delete_message))
        .route_layer(from_fn(require_login));

    let staff = Router::new()
        .route("/inv", get(inventory::management))
        .route("/inv/", get(inventory::management))
        .route(
            "/inv/getInventory/{classification_id}",
            get(inventory::inventory_json),
        )
        .route(
            "/inv/addClassification",
            get(inventory::add_classification_form).post(inventory::add_classification),
        )
        .route(
            "/inv/addInventory",
            get(inventory::add_inventory_form).post(inventory::add_inventory),
        )
        .route("/inv/edit/{inv_id}", get(inventory::edit_inventory_form))
        .route("/inv/update", post(inventory::update_inventory))
        .route("/inv/delete/{inv_id}", get(inventory::delete_confirm))
        .route("/inv/remove", post(inventory::remove_inventory))
        .route_layer(from_fn(require_staff));

    let site = Router::new()
        .merge(public)
        .merge(signed_in)
        .merge(staff)
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_page))
        .layer(from_fn_with_state(state.clone(), render_error_pages))
        .layer(from_fn_with_state(state.clone(), resolve_identity))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            info_span!(
                "request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = %Uuid::new_v4(),
            )
        }))
        .with_state(state);

    // Merge the site with the Swagger UI router for a complete application.
    site.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
