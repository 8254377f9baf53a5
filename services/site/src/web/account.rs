//! services/site/src/web/account.rs
//!
//! Handlers for registration, login, logout and account maintenance.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use dealership_core::domain::{AccountUpdate, Identity, NewAccount};
use dealership_core::ports::PortError;
use dealership_core::rules::{self, EMAIL_EXISTS};
use dealership_core::validation::{ErrorSet, FormInput};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::auth::{self, LoginError};
use crate::web::context::{CurrentAccount, RequestContext, LOGIN_PATH};
use crate::web::cookies::SetCookie;
use crate::web::error::AppError;
use crate::web::flash::Notice;
use crate::web::gate::{self, Checked};
use crate::web::state::AppState;
use crate::web::view::View;

pub const ACCOUNT_HOME: &str = "/account/";

fn login_view() -> View {
    View::new("account/login", "Login")
}

fn register_view() -> View {
    View::new("account/register", "Registration")
}

fn edit_view(identity: &Identity) -> View {
    View::new("account/edit-account", "Edit Account").form(
        FormInput::new()
            .with("account_id", identity.account_id.to_string())
            .with("account_firstname", &identity.first_name)
            .with("account_lastname", &identity.last_name)
            .with("account_email", &identity.email),
    )
}

fn email_taken(view: View, input: &FormInput) -> View {
    let mut errors = ErrorSet::default();
    errors.push("account_email", EMAIL_EXISTS);
    let form = input.echo().over(view.form.clone());
    view.status(StatusCode::UNPROCESSABLE_ENTITY)
        .errors(errors)
        .form(form)
}

/// Issues a fresh token for `identity` and sends the caller to the account home.
fn signed_in(state: &AppState, identity: &Identity, notice: Option<&str>) -> Result<Response, AppError> {
    let token = state.sessions.issue(identity)?;
    let cookie = SetCookie(state.sessions.session_cookie(&token));
    let redirect = Redirect::to(ACCOUNT_HOME);
    Ok(match notice {
        Some(notice) => (cookie, Notice::new(notice), redirect).into_response(),
        None => (cookie, redirect).into_response(),
    })
}

//=========================================================================================
// Views
//=========================================================================================

pub async fn account_home(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
) -> Result<Response, AppError> {
    let unread = state.db.count_unread(identity.account_id).await?;
    let view = View::new("account/account", "Account Management").data(json!({ "unread": unread }));
    Ok(state.page(&ctx, view))
}

pub async fn login_form(State(state): State<Arc<AppState>>, ctx: RequestContext) -> Response {
    state.page(&ctx, login_view())
}

pub async fn register_form(State(state): State<Arc<AppState>>, ctx: RequestContext) -> Response {
    state.page(&ctx, register_view())
}

pub async fn edit_account_form(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
) -> Response {
    state.page(&ctx, edit_view(&identity))
}

//=========================================================================================
// Registration and Login
//=========================================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    let input = match gate::check(&state, rules::registration(), input).await? {
        Checked::Valid(input) => input,
        Checked::Invalid(rejected) => return Ok(state.page(&ctx, rejected.into_view(register_view()))),
    };

    let password_hash = state
        .passwords
        .hash(input.get("account_password").to_string())
        .await?;
    let account = NewAccount {
        first_name: input.get("account_firstname").to_string(),
        last_name: input.get("account_lastname").to_string(),
        email: input.get("account_email").to_string(),
        password_hash,
    };

    match state.db.create_account(account).await {
        Ok(account) => {
            info!(account_id = account.account_id, "Registered a new account");
            let notice = format!(
                "Congratulations, you're registered {}. Please log in.",
                account.first_name
            );
            Ok((Notice::new(notice), Redirect::to(LOGIN_PATH)).into_response())
        }
        Err(PortError::Conflict(e)) => {
            warn!("Registration raced another account for the same email: {}", e);
            Ok(state.page(&ctx, email_taken(register_view(), &input)))
        }
        Err(e) => {
            error!("Failed to register account: {}", e);
            let view = register_view()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice("Sorry, the registration failed.")
                .form(input.echo());
            Ok(state.page(&ctx, view))
        }
    }
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    let password = input.get("account_password").to_string();
    let input = match gate::check(&state, rules::login(), input).await? {
        Checked::Valid(input) => input,
        Checked::Invalid(rejected) => return Ok(state.page(&ctx, rejected.into_view(login_view()))),
    };
    let email = input.get("account_email");
    let kept = FormInput::new().with("account_email", email);

    match auth::authenticate(state.db.as_ref(), &state.passwords, email, &password).await {
        Ok(identity) => {
            info!(account_id = identity.account_id, "Account signed in");
            signed_in(&state, &identity, None)
        }
        Err(LoginError::InvalidCredentials) => {
            warn!("Rejected a sign-in attempt");
            let view = login_view()
                .status(StatusCode::UNAUTHORIZED)
                .notice("Please check your credentials and try again.")
                .form(kept);
            Ok(state.page(&ctx, view))
        }
        Err(LoginError::Store(e)) => {
            error!("Failed to look up account for sign-in: {}", e);
            let view = login_view()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice("Sorry, there was an error processing the login.")
                .form(kept);
            Ok(state.page(&ctx, view))
        }
        Err(LoginError::Password(e)) => Err(e.into()),
    }
}

/// Clears the session cookie. Safe to call without a session.
pub async fn logout(State(state): State<Arc<AppState>>) -> Response {
    (SetCookie(state.sessions.clear_cookie()), Redirect::to("/")).into_response()
}

//=========================================================================================
// Account Maintenance
//=========================================================================================

/// The submitted `account_id` must be the caller's own.
fn own_account_id(input: &FormInput, identity: &Identity) -> Result<i32, AppError> {
    match input.parse::<i32>("account_id") {
        Some(id) if id == identity.account_id => Ok(id),
        _ => {
            warn!(
                account_id = identity.account_id,
                "Refused an update for another account"
            );
            Err(AppError::NotFound(format!(
                "account {}",
                input.get("account_id")
            )))
        }
    }
}

pub async fn update_account(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    let input = match gate::check(&state, rules::edit_account(), input).await? {
        Checked::Valid(input) => input,
        Checked::Invalid(rejected) => {
            return Ok(state.page(&ctx, rejected.into_view(edit_view(&identity))))
        }
    };
    let account_id = own_account_id(&input, &identity)?;

    let update = AccountUpdate {
        account_id,
        first_name: input.get("account_firstname").to_string(),
        last_name: input.get("account_lastname").to_string(),
        email: input.get("account_email").to_string(),
    };
    match state.db.update_account(update).await {
        Ok(account) => {
            info!(account_id, "Updated account details");
            signed_in(
                &state,
                &account.identity(),
                Some("Successfully updated your information."),
            )
        }
        Err(PortError::Conflict(_)) => Ok(state.page(&ctx, email_taken(edit_view(&identity), &input))),
        Err(e) => {
            error!("Failed to update account {}: {}", account_id, e);
            let view = edit_view(&identity)
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice("Sorry, the update failed.");
            let form = input.echo().over(view.form.clone());
            Ok(state.page(&ctx, view.form(form)))
        }
    }
}

pub async fn update_password(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    let input = match gate::check(&state, rules::edit_password(), input).await? {
        Checked::Valid(input) => input,
        Checked::Invalid(rejected) => {
            return Ok(state.page(&ctx, rejected.into_view(edit_view(&identity))))
        }
    };
    let account_id = own_account_id(&input, &identity)?;

    let password_hash = state
        .passwords
        .hash(input.get("account_password").to_string())
        .await?;
    match state.db.update_password(account_id, &password_hash).await {
        Ok(account) => {
            info!(account_id, "Updated account password");
            signed_in(
                &state,
                &account.identity(),
                Some("Congratulations, password successfully updated."),
            )
        }
        Err(e) => {
            error!("Failed to update password for account {}: {}", account_id, e);
            let view = edit_view(&identity)
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice("Sorry, the update failed.");
            Ok(state.page(&ctx, view))
        }
    }
}
