//! Field-scoped form validation
//!
//! Validation failures are keyed by field name so a form can show each message
//! next to its input and drop it again once the input is corrected.

use crate::requests::{LoginRequest, NewJob, NewWage, ProfileUpdate, RegisterRequest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(transparent)]
pub struct FormErrors {
    fields: BTreeMap<String, String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field, replacing any earlier one
    pub fn set(&mut self, field: &str, message: impl Into<String>) {
        self.fields.insert(field.to_string(), message.into());
    }

    /// Drop the message for a field once its input has been corrected
    pub fn clear_field(&mut self, field: &str) -> bool {
        self.fields.remove(field).is_some()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Re-validate a single field: replace its message with the fresh result
    pub fn revalidate_field(&mut self, field: &str, fresh: &FormErrors) {
        match fresh.get(field) {
            Some(message) => self.set(field, message),
            None => {
                self.clear_field(field);
            }
        }
    }

    /// `Ok(())` when there is nothing to report
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Types that can check their own fields
pub trait Validate {
    fn validate(&self) -> FormErrors;
}

impl Validate for RegisterRequest {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();

        if self.name.trim().is_empty() {
            errors.set("name", "Name is required");
        }
        check_email(&mut errors, &self.email);
        if self.password.len() < MIN_PASSWORD_LENGTH {
            errors.set(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }
        match self.phone.as_deref().map(str::trim) {
            None | Some("") => errors.set("phone", "Phone number is required"),
            Some(phone) if !is_phone_number(phone) => {
                errors.set("phone", "Phone number must have 10 to 15 digits")
            }
            _ => {}
        }
        if !self.role.is_self_registrable() {
            errors.set("role", "Role must be worker or employer");
        }

        errors
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        if self.email.trim().is_empty() {
            errors.set("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.set("password", "Password is required");
        }
        errors
    }
}

impl Validate for ProfileUpdate {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.set("name", "Name cannot be empty");
            }
        }
        if let Some(phone) = self.phone.as_deref().map(str::trim) {
            if !phone.is_empty() && !is_phone_number(phone) {
                errors.set("phone", "Phone number must have 10 to 15 digits");
            }
        }
        if let Some(experience) = self.experience {
            if experience > 80 {
                errors.set("experience", "Experience must be at most 80 years");
            }
        }
        errors
    }
}

impl Validate for NewJob {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();

        if self.title.trim().is_empty() {
            errors.set("title", "Title is required");
        }
        if self.description.trim().is_empty() {
            errors.set("description", "Description is required");
        }
        if !(self.wage.amount.is_finite() && self.wage.amount > 0.0) {
            errors.set("wage.amount", "Wage amount must be greater than zero");
        }
        if self.duration.trim().is_empty() {
            errors.set("duration", "Duration is required");
        }
        if self.workers_needed == Some(0) {
            errors.set("workers_needed", "At least one worker is needed");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.set("end_date", "End date cannot be before the start date");
            }
        }

        errors
    }
}

impl Validate for NewWage {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();

        if self.category.trim().is_empty() {
            errors.set("category", "Category is required");
        }
        if !(self.average_wage.is_finite() && self.average_wage > 0.0) {
            errors.set("average_wage", "Average wage must be greater than zero");
        }
        if let Some(min) = self.min_wage {
            if min > self.average_wage {
                errors.set("min_wage", "Minimum wage cannot exceed the average");
            }
        }
        if let Some(max) = self.max_wage {
            if max < self.average_wage {
                errors.set("max_wage", "Maximum wage cannot be below the average");
            }
        }

        errors
    }
}

fn check_email(errors: &mut FormErrors, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.set("email", "Email is required");
    } else if !is_email(email) {
        errors.set("email", "Email address is invalid");
    }
}

/// Loose shape check: one `@`, a non-empty local part, a dotted domain
pub fn is_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !email.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// Digits with optional `+`, spaces and dashes; 10 to 15 digits in total
pub fn is_phone_number(phone: &str) -> bool {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    allowed && (10..=15).contains(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobCategory, Role, Wage, WageUnit};

    fn registration() -> RegisterRequest {
        RegisterRequest {
            name: "Ravi Kumar".to_string(),
            email: "ravi@example.com".to_string(),
            password: "secret12".to_string(),
            role: Role::Worker,
            phone: Some("+91 98765-43210".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(registration().validate().is_empty());
    }

    #[test]
    fn test_registration_errors_are_field_scoped() {
        let request = RegisterRequest {
            name: " ".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
            role: Role::Admin,
            phone: None,
            ..Default::default()
        };

        let errors = request.validate();
        assert_eq!(errors.len(), 5);
        assert!(errors.has("name"));
        assert!(errors.has("email"));
        assert!(errors.has("password"));
        assert!(errors.has("phone"));
        assert!(errors.has("role"));
    }

    #[test]
    fn test_errors_clear_as_input_is_corrected() {
        let mut request = registration();
        request.email = "bad".to_string();
        let mut shown = request.validate();
        assert!(shown.has("email"));

        request.email = "ravi@example.com".to_string();
        shown.revalidate_field("email", &request.validate());
        assert!(shown.is_empty());
    }

    #[test]
    fn test_job_posting_validation() {
        let job = NewJob {
            title: String::new(),
            description: "desc".to_string(),
            category: JobCategory::Other,
            location: Default::default(),
            wage: Wage {
                amount: 0.0,
                unit: WageUnit::Daily,
            },
            duration: "1 day".to_string(),
            workers_needed: Some(0),
            requirements: vec![],
            start_date: None,
            end_date: None,
        };

        let errors = job.validate();
        assert!(errors.has("title"));
        assert!(errors.has("wage.amount"));
        assert!(errors.has("workers_needed"));
        assert!(!errors.has("description"));
        assert_eq!(
            errors.to_string(),
            "title: Title is required; wage.amount: Wage amount must be greater than zero; workers_needed: At least one worker is needed"
        );
    }

    #[test]
    fn test_wage_range_validation() {
        let wage = NewWage {
            category: "delivery".to_string(),
            location: Default::default(),
            average_wage: 500.0,
            min_wage: Some(600.0),
            max_wage: Some(400.0),
            currency: None,
        };

        let errors = wage.validate();
        assert!(errors.has("min_wage"));
        assert!(errors.has("max_wage"));
    }

    #[test]
    fn test_email_and_phone_shapes() {
        assert!(is_email("a@b.in"));
        assert!(!is_email("a@b"));
        assert!(!is_email("a@@b.in"));
        assert!(!is_email("@b.in"));
        assert!(is_phone_number("9876543210"));
        assert!(!is_phone_number("98765"));
        assert!(!is_phone_number("98765abc43210"));
    }
}
