use std::borrow::Cow;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{Error, Result};
use crate::models::job_application::ApplicationStatus;

pub const CONTRACT_TYPES: [&str; 5] = ["CDI", "CDD", "Stage", "Alternance", "Freelance"];

pub fn error_with_message(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Single-field failure, for rules checked outside of the derive.
pub fn field_error(
    field: &'static str,
    code: &'static str,
    message: impl Into<Cow<'static, str>>,
) -> Error {
    let mut errors = ValidationErrors::new();
    errors.add(field, error_with_message(code, message));
    Error::Validation(errors)
}

/// Runs the derived rules and folds in extra cross-field checks.
pub fn validate_with<T, F>(val: &T, extra: F) -> Result<()>
where
    T: Validate,
    F: FnOnce(&mut ValidationErrors),
{
    let mut errors = match val.validate() {
        Ok(()) => ValidationErrors::new(),
        Err(errors) => errors,
    };
    extra(&mut errors);
    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(errors))
    }
}

pub fn check_salary_range(
    errors: &mut ValidationErrors,
    salary_min: Option<Decimal>,
    salary_max: Option<Decimal>,
) {
    if let (Some(min), Some(max)) = (salary_min, salary_max) {
        if max < min {
            errors.add(
                "salary_max",
                error_with_message(
                    "gte",
                    "The salary max must be greater than or equal to salary min.",
                ),
            );
        }
    }
}

pub fn contract_type(value: &str) -> std::result::Result<(), ValidationError> {
    if CONTRACT_TYPES.contains(&value) {
        Ok(())
    } else {
        Err(error_with_message(
            "in",
            format!(
                "The contract type must be one of: {}.",
                CONTRACT_TYPES.join(", ")
            ),
        ))
    }
}

pub fn non_negative(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(error_with_message("min", "The value must be at least 0."))
    } else {
        Ok(())
    }
}

pub fn after_today(value: &NaiveDate) -> std::result::Result<(), ValidationError> {
    if *value > crate::utils::time::today() {
        Ok(())
    } else {
        Err(error_with_message("after", "The date must be a date after today."))
    }
}

pub fn application_status(value: &str) -> std::result::Result<(), ValidationError> {
    value.parse::<ApplicationStatus>().map(|_| ()).map_err(|_| {
        error_with_message(
            "in",
            "The status must be one of: pending, reviewing, accepted, rejected.",
        )
    })
}
