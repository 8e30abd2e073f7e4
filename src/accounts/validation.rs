use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::accounts::dto::{LoginRequest, RegisterRequest, UpdateAccountRequest};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MIN_NAME_LENGTH: usize = 3;
pub const MAX_NAME_LENGTH: usize = 100;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
    // E.164-ish: optional '+', 2 to 15 digits, no leading zero
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[1-9][0-9]{1,14}$").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("invalid email format")]
    InvalidEmail,
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
    #[error("password must contain at least one letter and one digit")]
    WeakPassword,
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },
    #[error("invalid phone number format")]
    InvalidPhone,
}

pub type ValidationResult = Result<(), ValidationError>;

fn required(field: &'static str, value: &str) -> ValidationResult {
    if value.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(())
}

fn length(field: &'static str, value: &str, min: usize, max: usize) -> ValidationResult {
    let n = value.chars().count();
    if n < min || n > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> ValidationResult {
    required("email", email)?;
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult {
    required("password", password)?;
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_letter && has_digit) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

pub fn validate_username(user_name: &str) -> ValidationResult {
    required("username", user_name)?;
    length("username", user_name, MIN_NAME_LENGTH, MAX_NAME_LENGTH)
}

pub fn validate_phone(phone: &str) -> ValidationResult {
    required("phone", phone)?;
    if !PHONE_RE.is_match(phone) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(())
}

pub fn validate_name(name: &str) -> ValidationResult {
    required("name", name)?;
    length("name", name, MIN_NAME_LENGTH, MAX_NAME_LENGTH)
}

/// Checks a registration candidate; the first failing rule is reported.
pub fn validate_registration(req: &RegisterRequest) -> ValidationResult {
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    validate_username(&req.user_name)?;
    validate_phone(&req.phone)?;
    validate_name(&req.name)?;
    required("city", &req.city)?;
    required("address", &req.address)
}

/// Login only needs something to compare against.
pub fn validate_login(req: &LoginRequest) -> ValidationResult {
    required("email", &req.email)?;
    required("password", &req.password)
}

/// Only supplied (non-empty) fields are checked.
pub fn validate_update(req: &UpdateAccountRequest) -> ValidationResult {
    if !req.email.is_empty() {
        validate_email(&req.email)?;
    }
    if !req.password.is_empty() {
        validate_password(&req.password)?;
    }
    if !req.user_name.is_empty() {
        validate_username(&req.user_name)?;
    }
    if !req.phone.is_empty() {
        validate_phone(&req.phone)?;
    }
    if !req.name.is_empty() {
        validate_name(&req.name)?;
    }
    Ok(())
}
