//! crates/dealership_core/src/rules.rs
//!
//! The rule sets of every form the site accepts.

use crate::validation::{Check, EmailScope, FieldRule, RuleSet, Sanitizer};

pub const EMAIL_EXISTS: &str = "Email exists. Please log in or use a different email.";

/// Ids are `serial` columns.
const ID_MAX: i64 = i32::MAX as i64;

/// Odometer readings are stored as `integer`.
pub const MILES_MAX: f64 = 10_000_000.0;

fn name(field: &'static str, min: usize, message: &'static str) -> FieldRule {
    FieldRule::new(field).check(Check::Length { min, max: None }, message)
}

fn names() -> [FieldRule; 2] {
    [
        name("account_firstname", 1, "Please provide a firstname."),
        name("account_lastname", 2, "Please provide a lastname."),
    ]
}

fn email(scope: Option<EmailScope>) -> FieldRule {
    let rule = FieldRule::new("account_email")
        .sanitize(Sanitizer::NormalizeEmail)
        .check(Check::Email, "A valid email is required.");
    match scope {
        Some(scope) => rule.check(Check::EmailAvailable(scope), EMAIL_EXISTS),
        None => rule,
    }
}

fn password() -> FieldRule {
    FieldRule::new("account_password")
        .sanitize(Sanitizer::Keep)
        .check(Check::StrongPassword, "Password does not meet requirements.")
}

fn account_id() -> FieldRule {
    FieldRule::new("account_id").check(
        Check::Integer {
            min: None,
            max: Some(ID_MAX),
        },
        "Account id is not an integer.",
    )
}

fn text(field: &'static str, min: usize, max: usize, message: &'static str) -> FieldRule {
    FieldRule::new(field).check(
        Check::Length {
            min,
            max: Some(max),
        },
        message,
    )
}

pub fn registration() -> RuleSet {
    let [first, last] = names();
    RuleSet::new(vec![first, last, email(Some(EmailScope::Anyone)), password()])
}

pub fn login() -> RuleSet {
    RuleSet::new(vec![email(None)])
}

pub fn edit_account() -> RuleSet {
    let [first, last] = names();
    RuleSet::new(vec![
        account_id(),
        first,
        last,
        email(Some(EmailScope::OtherThan("account_id"))),
    ])
}

pub fn edit_password() -> RuleSet {
    RuleSet::new(vec![account_id(), password()])
}

pub fn classification() -> RuleSet {
    RuleSet::new(vec![FieldRule::new("classification_name")
        .check(Check::Alpha, "Please provide a valid class name.")
        .check(Check::Length { min: 1, max: None }, "Please provide a class name.")])
}

fn vehicle_fields() -> Vec<FieldRule> {
    vec![
        FieldRule::new("classification_id").check(
            Check::Integer {
                min: Some(1),
                max: Some(ID_MAX),
            },
            "Please select a class.",
        ),
        text("inv_make", 3, 100, "Please provide the make."),
        text("inv_model", 3, 100, "Please provide the model."),
        text("inv_description", 1, 100, "Please provide a description."),
        text("inv_image", 1, 100, "Please provide a valid image path."),
        text("inv_thumbnail", 1, 100, "Please provide a valid thumbnail."),
        FieldRule::new("inv_price").check(
            Check::Decimal {
                min: 0.01,
                max: 10_000_000.0,
            },
            "Please provide the price.",
        ),
        FieldRule::new("inv_year").check(
            Check::Integer {
                min: Some(1000),
                max: Some(5000),
            },
            "Please provide vehicle year.",
        ),
        FieldRule::new("inv_miles").check(
            Check::Numeric { max: MILES_MAX },
            "Please provide total miles.",
        ),
        text("inv_color", 1, 100, "Please provide the color."),
    ]
}

pub fn new_vehicle() -> RuleSet {
    RuleSet::new(vehicle_fields())
}

pub fn vehicle_update() -> RuleSet {
    let mut fields = vehicle_fields();
    fields.push(FieldRule::new("inv_id").check(
        Check::Integer {
            min: Some(1),
            max: Some(ID_MAX),
        },
        "Vehicle id is not an integer.",
    ));
    RuleSet::new(fields)
}

pub fn message() -> RuleSet {
    RuleSet::new(vec![
        FieldRule::new("message_to").check(
            Check::Integer {
                min: Some(1),
                max: Some(ID_MAX),
            },
            "Please select a recipient.",
        ),
        text("message_subject", 1, 255, "Please provide a subject."),
        FieldRule::new("message_body")
            .check(Check::Length { min: 1, max: None }, "Please provide a message."),
    ])
}
