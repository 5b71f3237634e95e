//! crates/timekeeper_core/src/validation.rs
//!
//! Stateless input checks. The `is_*` predicates answer yes/no; the `check_*`
//! functions wrap them into `CoreError::Validation` with the user-facing message.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{CoreError, CoreResult};

pub const MAX_TASK_LEN: usize = 500;
pub const MAX_NOTES_LEN: usize = 1000;
pub const MAX_REASON_LEN: usize = 500;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const MAX_PROJECT_NAME_LEN: usize = 255;
pub const MIN_HOURS: f64 = 0.1;
pub const MAX_HOURS: f64 = 24.0;

pub const PASSWORD_REQUIREMENTS: &str =
    "Password must be at least 8 characters and include uppercase, lowercase, and number";

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

//=========================================================================================
// Predicates
//=========================================================================================

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn is_valid_password(password: &str) -> bool {
    char_len(password) >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

pub fn is_valid_full_name(full_name: &str) -> bool {
    let len = char_len(full_name.trim());
    (2..=255).contains(&len)
}

pub fn is_valid_hours(hours: f64) -> bool {
    (MIN_HOURS..=MAX_HOURS).contains(&hours)
}

pub fn is_valid_latitude(latitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude)
}

pub fn is_valid_longitude(longitude: f64) -> bool {
    (-180.0..=180.0).contains(&longitude)
}

pub fn is_future_date(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}

//=========================================================================================
// Checks
//=========================================================================================

pub fn check_email(email: &str) -> CoreResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(CoreError::validation("Invalid email format"))
    }
}

pub fn check_password(password: &str) -> CoreResult<()> {
    if is_valid_password(password) {
        Ok(())
    } else {
        Err(CoreError::validation(PASSWORD_REQUIREMENTS))
    }
}

pub fn check_full_name(full_name: &str) -> CoreResult<()> {
    if is_valid_full_name(full_name) {
        Ok(())
    } else {
        Err(CoreError::validation(
            "Full name must be between 2 and 255 characters",
        ))
    }
}

/// The field rules a daily report must satisfy, both on creation and on edit.
pub fn check_report_fields(tasks: &[String], hours: f64, notes: Option<&str>) -> CoreResult<()> {
    if tasks.is_empty() {
        return Err(CoreError::validation("At least one task is required"));
    }
    for task in tasks {
        if task.trim().is_empty() {
            return Err(CoreError::validation("All tasks must be non-empty strings"));
        }
        if char_len(task) > MAX_TASK_LEN {
            return Err(CoreError::validation(
                "Each task must be 500 characters or less",
            ));
        }
    }
    if !is_valid_hours(hours) {
        return Err(CoreError::validation(
            "Hours worked must be between 0.1 and 24",
        ));
    }
    if notes.is_some_and(|n| char_len(n) > MAX_NOTES_LEN) {
        return Err(CoreError::validation(
            "Notes must be 1000 characters or less",
        ));
    }
    Ok(())
}

pub fn check_rejection_reason(reason: Option<&str>) -> CoreResult<()> {
    if reason.is_some_and(|r| char_len(r) > MAX_REASON_LEN) {
        return Err(CoreError::validation(
            "Rejection reason must be 500 characters or less",
        ));
    }
    Ok(())
}

pub fn check_edit_reason(reason: &str) -> CoreResult<()> {
    if reason.trim().is_empty() {
        return Err(CoreError::validation("Reason is required"));
    }
    if char_len(reason) > MAX_REASON_LEN {
        return Err(CoreError::validation(
            "Reason must be 500 characters or less",
        ));
    }
    Ok(())
}

pub fn check_task_description(description: &str) -> CoreResult<()> {
    if description.trim().is_empty() {
        return Err(CoreError::validation("Task description is required"));
    }
    if char_len(description) > MAX_DESCRIPTION_LEN {
        return Err(CoreError::validation(
            "Task description must be 500 characters or less",
        ));
    }
    Ok(())
}

/// Validates and returns the trimmed project name.
pub fn check_project_name(name: &str) -> CoreResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation("Project name is required"));
    }
    if char_len(name) > MAX_PROJECT_NAME_LEN {
        return Err(CoreError::validation(
            "Project name must be 255 characters or less",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn check_coordinates(latitude: f64, longitude: f64) -> CoreResult<()> {
    if !is_valid_latitude(latitude) {
        return Err(CoreError::validation("Latitude must be between -90 and 90"));
    }
    if !is_valid_longitude(longitude) {
        return Err(CoreError::validation(
            "Longitude must be between -180 and 180",
        ));
    }
    Ok(())
}
