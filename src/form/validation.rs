/*
 * Responsibility
 * - per-field rules: validate(field, value, ctx) -> Option<message>
 * - ValidationState: field -> message, merged one field at a time
 * - pre-submit check (required fields + rules on what is filled in)
 */
use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::form::date;
use crate::form::model::{EmployeeProfile, Field};

pub const LAST_NAME_MAX: usize = 20;
pub const FIRST_NAME_MAX: usize = 50;
pub const MIN_AGE: i32 = 16;
pub const SALARY_FLOOR: f64 = 1000.0;

static SPECIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[!@#$%^&*(),.?":\\|{}<>0-9]"#).expect("valid regex"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0[0-9]{9,11}$").expect("valid regex"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub today: NaiveDate,
}

/// Field -> error message. A missing entry means the field is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationState(BTreeMap<Field, String>);

impl ValidationState {
    /// Returns a new state where only `field`'s entry reflects `outcome`.
    pub fn with(&self, field: Field, outcome: Option<String>) -> Self {
        let mut next = self.0.clone();
        match outcome {
            Some(msg) => {
                next.insert(field, msg);
            }
            None => {
                next.remove(&field);
            }
        }
        Self(next)
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }
}

fn name_rule(label: &str, value: &str, max: usize) -> Option<String> {
    if value.chars().count() > max {
        Some(format!("{label} must not exceed {max} characters"))
    } else if SPECIAL_CHARS.is_match(value) {
        Some(format!("{label} must not contain digits or special characters"))
    } else {
        None
    }
}

/// Runs the rule for one field. `None` means valid.
pub fn validate(field: Field, value: &str, ctx: &ValidationContext) -> Option<String> {
    match field {
        Field::LastName => name_rule("Last name", value, LAST_NAME_MAX),
        Field::FirstName => name_rule("First name", value, FIRST_NAME_MAX),
        Field::PhoneNumber => (!PHONE.is_match(value)).then(|| {
            "Phone number must start with 0 and have 10-12 digits".to_string()
        }),
        Field::Gender => value
            .trim()
            .is_empty()
            .then(|| "Gender must be selected".to_string()),
        Field::DateOfBirth => {
            // empty is left to the required check
            if value.trim().is_empty() {
                return None;
            }
            match date::parse_input(value) {
                Ok(parts) if date::age_on(parts, ctx.today) >= MIN_AGE => None,
                Ok(_) => Some(format!("Employee must be at least {MIN_AGE} years old")),
                Err(_) => Some("Date of birth must be YYYY-MM-DD".to_string()),
            }
        }
        Field::Email => (!EMAIL.is_match(value)).then(|| "Email is not well formed".to_string()),
        Field::Salary => match value.trim().parse::<f64>() {
            Ok(n) if n > SALARY_FLOOR => None,
            Ok(_) => Some(format!("Salary must be greater than {SALARY_FLOOR}")),
            Err(_) => Some("Salary must be a number".to_string()),
        },
        Field::Position | Field::StreetName => None,
    }
}

fn required_message(field: Field) -> String {
    match field {
        Field::Gender => "Gender must be selected".to_string(),
        other => format!("{} is required", other.as_str().replace('_', " ")),
    }
}

/// Full check before submit: every required field filled in, every rule passing.
/// All violations are reported together.
pub fn validate_for_submit(
    profile: &EmployeeProfile,
    current: &ValidationState,
    ctx: &ValidationContext,
) -> ValidationState {
    Field::REQUIRED.iter().fold(current.clone(), |state, &field| {
        let value = profile.value(field);
        let outcome = if value.trim().is_empty() {
            Some(required_message(field))
        } else {
            validate(field, &value, ctx)
        };
        state.with(field, outcome)
    })
}
