//! Field validation primitives and form-level aggregators.
//!
//! All predicates are pure and side-effect free. Form aggregators collect
//! failures into a field→message map (`FormValidation`); a missing key means
//! the field is valid. Messages are the user-facing Spanish strings the
//! screens render inline.

use shared::{FormValidation, LoginForm, RegistrationForm};
use std::collections::HashMap;

use crate::domain::currency::parse_currency_input;

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MIN_PASSWORD_LENGTH: usize = 6;

/// Structural email check.
///
/// Known permissiveness: a domain without a top-level suffix
/// (`user@domain`) passes, and a trailing dot after the local part
/// (`user.@domain.com`) passes. Leading dots, consecutive dots, and domains
/// starting or ending with a dot are rejected.
pub fn validate_email(input: &str) -> bool {
    let email = input.trim();
    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return false;
    }
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    if email.matches('@').count() != 1 {
        return false;
    }
    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return false,
    };
    if local.is_empty() || local.len() > MAX_LOCAL_PART_LENGTH {
        return false;
    }
    if local.starts_with('.') || local.contains("..") {
        return false;
    }
    if domain.is_empty() || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    if domain.contains("..") {
        return false;
    }
    true
}

/// Minimum-length password check. No charset requirement: six spaces pass.
pub fn validate_password(input: &str) -> bool {
    input.chars().count() >= MIN_PASSWORD_LENGTH
}

/// Age must be within the range the app serves
pub fn validate_age(age: i32) -> bool {
    (18..=120).contains(&age)
}

/// Monthly income must be positive and below the sanity cap
pub fn validate_income(income: f64) -> bool {
    income > 0.0 && income <= 1_000_000.0
}

/// Declared savings may be zero but not negative, below the sanity cap
pub fn validate_savings(savings: f64) -> bool {
    (0.0..=10_000_000.0).contains(&savings)
}

/// Guard for the "current amount" entry of the registration workflow.
/// Accepts live-typed currency text; returns the parsed amount when it is a
/// number greater than zero.
pub fn validate_amount(input: &str) -> Option<f64> {
    if input.trim().is_empty() {
        return None;
    }
    let amount = parse_currency_input(input);
    if amount > 0.0 {
        Some(amount)
    } else {
        None
    }
}

/// Validate the login form, collecting one message per failing field
pub fn validate_login_form(form: &LoginForm) -> FormValidation {
    let mut errors = HashMap::new();

    if form.email.trim().is_empty() {
        errors.insert("email".to_string(), "El correo es obligatorio".to_string());
    } else if !validate_email(&form.email) {
        errors.insert("email".to_string(), "Correo electrónico inválido".to_string());
    }

    if form.password.is_empty() {
        errors.insert("password".to_string(), "La contraseña es obligatoria".to_string());
    } else if !validate_password(&form.password) {
        errors.insert(
            "password".to_string(),
            "La contraseña debe tener al menos 6 caracteres".to_string(),
        );
    }

    FormValidation::new(errors)
}

/// Validate the account registration form, collecting one message per
/// failing field
pub fn validate_registration_form(form: &RegistrationForm) -> FormValidation {
    let mut errors = HashMap::new();

    if form.email.trim().is_empty() {
        errors.insert("email".to_string(), "El correo es obligatorio".to_string());
    } else if !validate_email(&form.email) {
        errors.insert("email".to_string(), "Correo electrónico inválido".to_string());
    }

    if form.password.is_empty() {
        errors.insert("password".to_string(), "La contraseña es obligatoria".to_string());
    } else if !validate_password(&form.password) {
        errors.insert(
            "password".to_string(),
            "La contraseña debe tener al menos 6 caracteres".to_string(),
        );
    }

    match form.age {
        None => {
            errors.insert("age".to_string(), "La edad es obligatoria".to_string());
        }
        Some(age) if !validate_age(age) => {
            errors.insert("age".to_string(), "Debes tener entre 18 y 120 años".to_string());
        }
        Some(_) => {}
    }

    match form.monthly_income {
        None => {
            errors.insert(
                "monthly_income".to_string(),
                "El ingreso mensual es obligatorio".to_string(),
            );
        }
        Some(income) if !validate_income(income) => {
            errors.insert(
                "monthly_income".to_string(),
                "El ingreso debe ser mayor que 0 y hasta 1.000.000".to_string(),
            );
        }
        Some(_) => {}
    }

    match form.current_savings {
        None => {
            errors.insert(
                "current_savings".to_string(),
                "El ahorro actual es obligatorio".to_string(),
            );
        }
        Some(savings) if !validate_savings(savings) => {
            errors.insert(
                "current_savings".to_string(),
                "El ahorro debe estar entre 0 y 10.000.000".to_string(),
            );
        }
        Some(_) => {}
    }

    FormValidation::new(errors)
}
