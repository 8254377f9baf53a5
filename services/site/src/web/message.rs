//! services/site/src/web/message.rs
//!
//! The internal inbox. Every route here runs behind the login guard, the
//! sender of a new message is always the caller, and a message can only be
//! seen or changed by the account it was sent to.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use dealership_core::domain::{Identity, Message, NewMessage};
use dealership_core::ports::{PortError, PortResult};
use dealership_core::rules;
use dealership_core::validation::{ErrorSet, FormInput};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::web::context::{path_id, CurrentAccount, RequestContext};
use crate::web::error::AppError;
use crate::web::flash::Notice;
use crate::web::gate::{self, Checked};
use crate::web::state::AppState;
use crate::web::view::View;

pub const INBOX: &str = "/message/";

/// Loads a message addressed to `identity`. Anyone else's message does not exist.
async fn owned_message(state: &AppState, identity: &Identity, message_id: i32) -> Result<Message, AppError> {
    match state.db.get_message(message_id).await? {
        Some(message) if message.to_account == identity.account_id => Ok(message),
        Some(_) => {
            warn!(
                message_id,
                account_id = identity.account_id,
                "Refused access to a message addressed to another account"
            );
            Err(AppError::NotFound(format!("message {}", message_id)))
        }
        None => Err(AppError::NotFound(format!("message {}", message_id))),
    }
}

fn message_id(input: &FormInput) -> Result<i32, AppError> {
    input
        .parse("message_id")
        .ok_or_else(|| AppError::NotFound(format!("message {}", input.get("message_id"))))
}

fn message_view(message: &Message) -> View {
    View::new("message/message", message.subject.clone()).data(json!({ "message": message }))
}

//=========================================================================================
// Inbox and Archive
//=========================================================================================

pub async fn inbox(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
) -> Result<Response, AppError> {
    let messages = state.db.messages_for(identity.account_id, false).await?;
    let unread = state.db.count_unread(identity.account_id).await?;
    let archived = state.db.count_archived(identity.account_id).await?;

    let view = View::new("message/inbox", format!("{} Inbox", identity.full_name())).data(json!({
        "messages": messages,
        "unread": unread,
        "archived": archived,
    }));
    Ok(state.page(&ctx, view))
}

pub async fn archive(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
) -> Result<Response, AppError> {
    let messages = state.db.messages_for(identity.account_id, true).await?;
    let view = View::new("message/archive", format!("{} Archive", identity.full_name()))
        .data(json!({ "messages": messages }));
    Ok(state.page(&ctx, view))
}

pub async fn message_detail(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, AppError> {
    let message = owned_message(&state, &identity, path_id(path)?).await?;
    Ok(state.page(&ctx, message_view(&message)))
}

//=========================================================================================
// Composing
//=========================================================================================

/// The two ways of sending a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compose {
    New,
    Reply,
}

impl Compose {
    fn template(self) -> &'static str {
        match self {
            Self::New => "message/create-message",
            Self::Reply => "message/reply-to-message",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::New => "New Message",
            Self::Reply => "Reply Message",
        }
    }

    fn sent(self) -> &'static str {
        match self {
            Self::New => "Message sent.",
            Self::Reply => "Reply sent.",
        }
    }

    fn failed(self) -> &'static str {
        match self {
            Self::New => "Sorry, the message was not successfully sent.",
            Self::Reply => "Sorry, the reply was not successfully sent.",
        }
    }

    /// The compose form with its recipient options. A reply only offers the
    /// account being replied to.
    async fn view(self, state: &AppState, reply_to: Option<i32>) -> Result<View, AppError> {
        let mut recipients = state.db.list_recipients().await?;
        if self == Self::Reply {
            recipients.retain(|r| Some(r.account_id) == reply_to);
        }
        Ok(View::new(self.template(), self.title()).data(json!({ "recipients": recipients })))
    }
}

pub async fn create_message_form(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let view = Compose::New.view(&state, None).await?;
    Ok(state.page(&ctx, view))
}

/// Prefills a reply to one of the caller's messages.
pub async fn reply_form(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    let original = owned_message(&state, &identity, message_id(&input)?).await?;
    let view = Compose::Reply
        .view(&state, Some(original.from_account))
        .await?
        .form(
            FormInput::new()
                .with("message_to", original.from_account.to_string())
                .with("message_subject", &original.subject)
                .with("message_body", format!("//////// {} ////////", original.body)),
        );
    Ok(state.page(&ctx, view))
}

async fn send(
    state: &AppState,
    ctx: &RequestContext,
    identity: &Identity,
    input: FormInput,
    compose: Compose,
) -> Result<Response, AppError> {
    let reply_to = input.parse::<i32>("message_to");
    let input = match gate::check(state, rules::message(), input).await? {
        Checked::Valid(input) => input,
        Checked::Invalid(rejected) => {
            let view = compose.view(state, reply_to).await?;
            return Ok(state.page(ctx, rejected.into_view(view)));
        }
    };
    let to_account: i32 = input
        .parse("message_to")
        .ok_or_else(|| AppError::Internal("validated message_to did not parse".to_string()))?;

    let message = NewMessage {
        to_account,
        from_account: identity.account_id,
        subject: input.get("message_subject").to_string(),
        body: input.get("message_body").to_string(),
    };
    match state.db.create_message(message).await {
        Ok(message) => {
            info!(message_id = message.message_id, "Message sent");
            Ok((Notice::new(compose.sent()), Redirect::to(INBOX)).into_response())
        }
        Err(PortError::UnknownReference(_)) => {
            let mut errors = ErrorSet::default();
            errors.push("message_to", "Please select a recipient.");
            let view = compose
                .view(state, reply_to)
                .await?
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .errors(errors)
                .form(input.echo());
            Ok(state.page(ctx, view))
        }
        Err(e) => {
            error!("Failed to send message: {}", e);
            let view = compose
                .view(state, reply_to)
                .await?
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice(compose.failed())
                .form(input.echo());
            Ok(state.page(ctx, view))
        }
    }
}

pub async fn create_message(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    send(&state, &ctx, &identity, input, Compose::New).await
}

pub async fn reply_message(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    send(&state, &ctx, &identity, input, Compose::Reply).await
}

//=========================================================================================
// Message Actions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAction {
    Read,
    Unread,
    Archive,
    Delete,
}

impl MessageAction {
    fn done(self) -> &'static str {
        match self {
            Self::Read => "Message marked as read.",
            Self::Unread => "Message marked as unread.",
            Self::Archive => "Message archived.",
            Self::Delete => "Message deleted.",
        }
    }

    fn failed(self) -> &'static str {
        match self {
            Self::Read | Self::Unread => "Sorry, the message could not be updated.",
            Self::Archive => "Sorry, the archive failed.",
            Self::Delete => "Sorry, the deletion failed.",
        }
    }

    async fn apply(self, state: &AppState, message_id: i32) -> PortResult<()> {
        match self {
            Self::Read => state.db.set_message_read(message_id, true).await,
            Self::Unread => state.db.set_message_read(message_id, false).await,
            Self::Archive => state.db.archive_message(message_id).await,
            Self::Delete => state.db.delete_message(message_id).await,
        }
    }
}

async fn act(
    state: &AppState,
    ctx: &RequestContext,
    identity: &Identity,
    input: &FormInput,
    action: MessageAction,
) -> Result<Response, AppError> {
    let message = owned_message(state, identity, message_id(input)?).await?;

    match action.apply(state, message.message_id).await {
        Ok(()) => {
            info!(message_id = message.message_id, ?action, "Applied message action");
            Ok((Notice::new(action.done()), Redirect::to(INBOX)).into_response())
        }
        Err(e) => {
            error!("Failed to apply {:?} to message {}: {}", action, message.message_id, e);
            let view = message_view(&message)
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice(action.failed());
            Ok(state.page(ctx, view))
        }
    }
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    act(&state, &ctx, &identity, &input, MessageAction::Read).await
}

pub async fn mark_unread(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    act(&state, &ctx, &identity, &input, MessageAction::Unread).await
}

pub async fn archive_message(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    act(&state, &ctx, &identity, &input, MessageAction::Archive).await
}

pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    CurrentAccount(identity): CurrentAccount,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    act(&state, &ctx, &identity, &input, MessageAction::Delete).await
}
