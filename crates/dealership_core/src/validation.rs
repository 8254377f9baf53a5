//! crates/dealership_core/src/validation.rs
//!
//! A declarative validation engine for submitted forms.
//!
//! Each route describes its constraints as a [`RuleSet`]: an ordered list of
//! [`FieldRule`]s, each with a sanitizer and an ordered list of checks. One
//! evaluator interprets every rule set, so the rules themselves can be tested
//! without any HTTP plumbing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::ports::{AccountDirectory, PortResult};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern is a valid regex")
});

/// Minimum length of a strong password.
pub const STRONG_PASSWORD_MIN_LEN: usize = 12;

//=========================================================================================
// Submitted Form Data
//=========================================================================================

/// The raw name/value pairs of a URL-encoded form body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormInput(BTreeMap<String, String>);

impl FormInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// The submitted value, or the empty string when the field is absent.
    pub fn get(&self, field: &str) -> &str {
        self.0.get(field).map(String::as_str).unwrap_or_default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn parse<T: FromStr>(&self, field: &str) -> Option<T> {
        self.get(field).trim().parse().ok()
    }

    /// The values that may be echoed back into a re-rendered form.
    /// Password fields are never echoed.
    pub fn echo(&self) -> FormInput {
        self.0
            .iter()
            .filter(|(field, _)| !field.contains("password"))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    /// Overlays `self` onto `base`: submitted values win over stored ones.
    pub fn over(self, mut base: FormInput) -> FormInput {
        base.0.extend(self.0);
        base
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormInput {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

//=========================================================================================
// Validation Errors
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// The ordered errors collected for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorSet(Vec<FieldError>);

impl ErrorSet {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The first message recorded for `field`.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn fields(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for error in &self.0 {
            if !seen.contains(&error.field.as_str()) {
                seen.push(&error.field);
            }
        }
        seen
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }
}

//=========================================================================================
// Rule Descriptors
//=========================================================================================

/// How a value is cleaned before it is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sanitizer {
    Trim,
    /// Trims and lowercases an email address.
    NormalizeEmail,
    /// Leaves the value untouched (passwords).
    Keep,
}

impl Sanitizer {
    fn apply(self, value: &str) -> String {
        match self {
            Self::Trim => value.trim().to_string(),
            Self::NormalizeEmail => value.trim().to_lowercase(),
            Self::Keep => value.to_string(),
        }
    }
}

/// Which accounts an email must not already belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailScope {
    /// No account may use the email.
    Anyone,
    /// No account other than the one whose id is submitted in the named field.
    OtherThan(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Length { min: usize, max: Option<usize> },
    Integer { min: Option<i64>, max: Option<i64> },
    Decimal { min: f64, max: f64 },
    /// An unsigned decimal number no greater than `max`.
    Numeric { max: f64 },
    Alpha,
    Email,
    StrongPassword,
    EmailAvailable(EmailScope),
}

impl Check {
    /// Evaluates every check that needs no store lookup.
    fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Length { min, max } => {
                let len = value.chars().count();
                len >= *min && max.map_or(true, |max| len <= max)
            }
            Self::Integer { min, max } => value.parse::<i64>().is_ok_and(|n| {
                min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max)
            }),
            Self::Decimal { min, max } => value
                .parse::<f64>()
                .is_ok_and(|n| n.is_finite() && n >= *min && n <= *max),
            Self::Numeric { max } => {
                is_unsigned_number(value) && value.parse::<f64>().is_ok_and(|n| n <= *max)
            }
            Self::Alpha => !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()),
            Self::Email => EMAIL_PATTERN.is_match(value),
            Self::StrongPassword => is_strong_password(value),
            Self::EmailAvailable(_) => true,
        }
    }

    async fn passes<D>(&self, value: &str, input: &FormInput, directory: &D) -> PortResult<bool>
    where
        D: AccountDirectory + ?Sized,
    {
        let Self::EmailAvailable(scope) = self else {
            return Ok(self.accepts(value));
        };
        let taken = match scope {
            EmailScope::Anyone => directory.email_exists(value).await?,
            EmailScope::OtherThan(id_field) => match input.parse::<i32>(id_field) {
                Some(account_id) => directory.email_used_by_other(value, account_id).await?,
                None => directory.email_exists(value).await?,
            },
        };
        Ok(!taken)
    }
}

fn is_unsigned_number(value: &str) -> bool {
    let mut parts = value.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    match parts.next() {
        Some(fraction) => digits(whole) && digits(fraction),
        None => digits(whole),
    }
}

/// At least twelve characters with one lowercase, one uppercase, one digit and one symbol.
pub fn is_strong_password(value: &str) -> bool {
    value.chars().count() >= STRONG_PASSWORD_MIN_LEN
        && value.chars().any(|c| c.is_lowercase())
        && value.chars().any(|c| c.is_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| !c.is_alphanumeric())
}

#[derive(Debug, Clone, PartialEq)]
struct Constraint {
    check: Check,
    message: &'static str,
}

/// The sanitizer and ordered constraints of one form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    field: &'static str,
    sanitizer: Sanitizer,
    constraints: Vec<Constraint>,
}

impl FieldRule {
    /// A rule for `field`; values are trimmed unless told otherwise.
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            sanitizer: Sanitizer::Trim,
            constraints: Vec::new(),
        }
    }

    pub fn sanitize(mut self, sanitizer: Sanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn check(mut self, check: Check, message: &'static str) -> Self {
        self.constraints.push(Constraint { check, message });
        self
    }
}

/// The ordered field rules of one route.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    fields: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new(fields: Vec<FieldRule>) -> Self {
        Self { fields }
    }

    /// Sanitizes `input` in place and returns every violation.
    ///
    /// Fields are visited in declared order and all of them are checked.
    /// Within a field, checking stops at the first failed constraint, so a
    /// field contributes at most one error.
    pub async fn evaluate<D>(&self, input: &mut FormInput, directory: &D) -> PortResult<ErrorSet>
    where
        D: AccountDirectory + ?Sized,
    {
        let mut errors = ErrorSet::default();
        for rule in &self.fields {
            let value = rule.sanitizer.apply(input.get(rule.field));
            input.insert(rule.field, value.clone());
            for constraint in &rule.constraints {
                if !constraint.check.passes(&value, input, directory).await? {
                    errors.push(rule.field, constraint.message);
                    break;
                }
            }
        }
        Ok(errors)
    }
}
