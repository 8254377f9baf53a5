//! services/site/src/web/gate.rs
//!
//! Runs a route's rule set over the submitted form and decides whether the
//! handler continues or re-renders its form.

use axum::http::StatusCode;
use dealership_core::validation::{ErrorSet, FormInput, RuleSet};
use tracing::info;

use crate::web::error::AppError;
use crate::web::state::AppState;
use crate::web::view::View;

pub enum Checked {
    /// Every rule passed. Carries the sanitized input.
    Valid(FormInput),
    Invalid(Rejected),
}

/// The errors of a failed submission and the values safe to echo back.
#[derive(Debug, Clone)]
pub struct Rejected {
    pub errors: ErrorSet,
    pub echo: FormInput,
}

impl Rejected {
    /// Fills the handler's form view with the errors and echoed values.
    pub fn into_view(self, view: View) -> View {
        let form = self.echo.over(view.form.clone());
        view.status(StatusCode::UNPROCESSABLE_ENTITY)
            .errors(self.errors)
            .form(form)
    }
}

pub async fn check(state: &AppState, rules: RuleSet, mut input: FormInput) -> Result<Checked, AppError> {
    let errors = rules.evaluate(&mut input, state.db.as_ref()).await?;
    if errors.is_empty() {
        return Ok(Checked::Valid(input));
    }
    info!(fields = ?errors.fields(), "Form submission failed validation");
    Ok(Checked::Invalid(Rejected {
        echo: input.echo(),
        errors,
    }))
}
