//! services/site/src/web/view.rs
//!
//! The data handed to the view renderer. Handlers never produce markup
//! themselves; they fill a [`View`] and the renderer turns it into a body.

use axum::http::StatusCode;
use dealership_core::domain::Identity;
use dealership_core::validation::{ErrorSet, FormInput};
use serde::Serialize;
use serde_json::Value;

/// A page to render.
#[derive(Debug, Clone, Serialize)]
pub struct View {
    /// Template name, e.g. `account/login`.
    pub template: &'static str,
    pub title: String,
    #[serde(skip)]
    pub status: StatusCode,
    /// Notices shown once at the top of the page.
    pub notices: Vec<String>,
    pub errors: ErrorSet,
    /// Values echoed back into the page's form fields.
    pub form: FormInput,
    /// The signed-in account, filled in when the page is rendered.
    pub account: Option<Identity>,
    /// Template-specific data.
    pub data: Value,
}

impl View {
    pub fn new(template: &'static str, title: impl Into<String>) -> Self {
        Self {
            template,
            title: title.into(),
            status: StatusCode::OK,
            notices: Vec::new(),
            errors: ErrorSet::default(),
            form: FormInput::new(),
            account: None,
            data: Value::Null,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn notice(mut self, notice: impl Into<String>) -> Self {
        self.notices.push(notice.into());
        self
    }

    pub fn errors(mut self, errors: ErrorSet) -> Self {
        self.errors = errors;
        self
    }

    pub fn form(mut self, form: FormInput) -> Self {
        self.form = form;
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to render view '{template}': {reason}")]
pub struct RenderError {
    pub template: String,
    pub reason: String,
}

/// Turns a [`View`] into a response body.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &View) -> Result<String, RenderError>;

    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }
}
