//! Input validation functions
//!
//! Request DTOs derive `validator::Validate` for the declarative rules;
//! the rules that need more than a length or range check live here.
//! [`ValidateInput::validate_input`] runs both and reports every failing
//! field at once.

use crate::errors::{FieldError, ValidationFailure};
use crate::models::UserRole;
use crate::types::{
    ChangePasswordRequest, CreateBookingRequest, CreatePetRequest, LoginRequest, RegisterRequest,
    UpdatePetRequest,
};
use chrono::{NaiveDate, Utc};
use regex_lite::Regex;
use std::sync::OnceLock;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate password strength
///
/// 8 to 128 characters with at least one lowercase letter, one uppercase
/// letter and one digit.
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }
    if len > 128 {
        return Err("Password cannot exceed 128 characters".to_string());
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                .to_string(),
        );
    }
    Ok(())
}

/// Validate an E.164-style phone number
pub fn validate_phone(phone: &str) -> Result<(), String> {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    let phone_regex =
        PHONE.get_or_init(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone pattern compiles"));
    if !phone_regex.is_match(phone) {
        return Err("Please provide a valid phone number".to_string());
    }
    Ok(())
}

/// Validate a date of birth is not in the future
pub fn validate_date_of_birth(date: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if date > today {
        return Err("Date of birth cannot be in the future".to_string());
    }
    Ok(())
}

/// Parse a resource identifier taken from a path or body
pub fn parse_id(raw: &str) -> Option<uuid::Uuid> {
    uuid::Uuid::parse_str(raw.trim()).ok()
}

/// Convert `validator` output into flat, camelCase field errors
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect_field_errors("", errors, &mut out);
    out
}

fn collect_field_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let name = if prefix.is_empty() {
            to_camel_case(field)
        } else {
            format!("{}.{}", prefix, to_camel_case(field))
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                for err in errs {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", name));
                    out.push(FieldError::new(name.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_field_errors(&name, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_field_errors(&format!("{}.{}", name, index), inner, out);
                }
            }
        }
    }
}

fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Full validation of a request body
pub trait ValidateInput {
    fn validate_input(&self) -> Result<(), ValidationFailure>;
}

fn finish(derived: Result<(), ValidationErrors>, mut extra: Vec<FieldError>) -> Result<(), ValidationFailure> {
    let mut errors = match derived {
        Ok(()) => Vec::new(),
        Err(e) => field_errors(&e),
    };
    errors.append(&mut extra);
    if errors.is_empty() {
        return Ok(());
    }
    errors.sort_by(|a, b| a.field.cmp(&b.field));
    Err(ValidationFailure { errors })
}

impl RegisterRequest {
    /// Trim text fields and normalize the email before validation
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self.profile.first_name = self.profile.first_name.trim().to_string();
        self.profile.last_name = self.profile.last_name.trim().to_string();
        self.profile.phone_number = self.profile.phone_number.trim().to_string();
        self
    }
}

impl ValidateInput for RegisterRequest {
    fn validate_input(&self) -> Result<(), ValidationFailure> {
        let mut extra = Vec::new();
        if let Err(msg) = validate_password(&self.password) {
            extra.push(FieldError::new("password", msg));
        }
        if let Err(msg) = validate_phone(&self.profile.phone_number) {
            extra.push(FieldError::new("profile.phoneNumber", msg));
        }
        if let Some(dob) = self.profile.date_of_birth {
            if let Err(msg) = validate_date_of_birth(dob, Utc::now().date_naive()) {
                extra.push(FieldError::new("profile.dateOfBirth", msg));
            }
        }
        if self.role == Some(UserRole::Admin) {
            extra.push(FieldError::new("role", "Invalid role specified"));
        }
        finish(self.validate(), extra)
    }
}

impl LoginRequest {
    pub fn normalized(mut self) -> Self {
        self.email = normalize_email(&self.email);
        self
    }
}

impl ValidateInput for LoginRequest {
    fn validate_input(&self) -> Result<(), ValidationFailure> {
        finish(self.validate(), Vec::new())
    }
}

impl ValidateInput for ChangePasswordRequest {
    fn validate_input(&self) -> Result<(), ValidationFailure> {
        let mut extra = Vec::new();
        if let Err(msg) = validate_password(&self.new_password) {
            extra.push(FieldError::new("newPassword", msg.replacen("Password", "New password", 1)));
        } else if self.new_password == self.current_password {
            extra.push(FieldError::new(
                "newPassword",
                "New password must be different from current password",
            ));
        }
        if self.confirm_password != self.new_password {
            extra.push(FieldError::new("confirmPassword", "Passwords do not match"));
        }
        finish(self.validate(), extra)
    }
}

impl CreatePetRequest {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.breed = self
            .breed
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        self
    }
}

impl ValidateInput for CreatePetRequest {
    fn validate_input(&self) -> Result<(), ValidationFailure> {
        let mut extra = Vec::new();
        if self.owner.is_some() {
            extra.push(FieldError::new("owner", "Owner cannot be set manually"));
        }
        finish(self.validate(), extra)
    }
}

impl UpdatePetRequest {
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.breed = self.breed.map(|b| b.trim().to_string());
        self
    }
}

impl ValidateInput for UpdatePetRequest {
    fn validate_input(&self) -> Result<(), ValidationFailure> {
        let mut extra = Vec::new();
        if self.owner.is_some() {
            extra.push(FieldError::new("owner", "Owner cannot be modified"));
        }
        finish(self.validate(), extra)
    }
}

impl ValidateInput for CreateBookingRequest {
    fn validate_input(&self) -> Result<(), ValidationFailure> {
        let mut extra = Vec::new();
        if parse_id(&self.pet).is_none() {
            extra.push(FieldError::new("pet", "Invalid pet ID format"));
        }
        finish(self.validate(), extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProfileInput;
    use proptest::prelude::*;

    fn register_request(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            role: None,
            profile: ProfileInput {
                first_name: "Alice".to_string(),
                last_name: "Smith".to_string(),
                phone_number: "+15551234567".to_string(),
                date_of_birth: None,
                gender: None,
            },
        }
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Passw0rd").is_ok());
        assert!(validate_password("password123").is_err());
        assert!(validate_password("PASSWORD123").is_err());
        assert!(validate_password("Password").is_err());
        assert!(validate_password("Pa1").is_err());
        assert!(validate_password(&format!("Aa1{}", "a".repeat(126))).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+15551234567").is_ok());
        assert!(validate_phone("4915112345678").is_ok());
        assert!(validate_phone("+0123456").is_err());
        assert!(validate_phone("555-1234").is_err());
        assert!(validate_phone("1").is_err());
        assert!(validate_phone("+1234567890123456").is_err());
    }

    #[test]
    fn test_validate_date_of_birth() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(validate_date_of_birth(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(), today).is_ok());
        assert!(validate_date_of_birth(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(), today).is_err());
    }

    #[test]
    fn test_register_request_valid() {
        let req = register_request(" Alice@Example.COM ", "Passw0rd!").normalized();
        assert_eq!(req.email, "alice@example.com");
        assert!(req.validate_input().is_ok());
    }

    #[test]
    fn test_register_request_collects_all_errors() {
        let mut req = register_request("not-an-email", "weak");
        req.profile.first_name = "A".to_string();
        req.profile.phone_number = "abc".to_string();

        let failure = req.validate_input().unwrap_err();
        let fields: Vec<&str> = failure.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
        assert!(fields.contains(&"profile.firstName"));
        assert!(fields.contains(&"profile.phoneNumber"));
    }

    #[test]
    fn test_register_rejects_admin_role() {
        let mut req = register_request("a@b.com", "Passw0rd");
        req.role = Some(UserRole::Admin);
        let failure = req.validate_input().unwrap_err();
        assert_eq!(failure.errors[0].field, "role");
    }

    #[test]
    fn test_change_password_rules() {
        let req = ChangePasswordRequest {
            current_password: "OldPassw0rd".to_string(),
            new_password: "OldPassw0rd".to_string(),
            confirm_password: "OldPassw0rd".to_string(),
        };
        let failure = req.validate_input().unwrap_err();
        assert_eq!(failure.errors[0].field, "newPassword");

        let req = ChangePasswordRequest {
            current_password: "OldPassw0rd".to_string(),
            new_password: "NewPassw0rd".to_string(),
            confirm_password: "Different1A".to_string(),
        };
        let failure = req.validate_input().unwrap_err();
        assert_eq!(failure.errors[0].field, "confirmPassword");
    }

    #[test]
    fn test_create_pet_rejects_owner_and_bad_ranges() {
        let req = CreatePetRequest {
            name: "Rex".to_string(),
            breed: None,
            age: Some(-1.0),
            weight: Some(900.0),
            owner: Some(serde_json::json!("someone-else")),
        };
        let failure = req.validate_input().unwrap_err();
        let fields: Vec<&str> = failure.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["age", "owner", "weight"]);
    }

    #[test]
    fn test_create_pet_normalizes_blank_breed() {
        let req = CreatePetRequest {
            name: "  Rex ".to_string(),
            breed: Some("   ".to_string()),
            age: None,
            weight: None,
            owner: None,
        }
        .normalized();
        assert_eq!(req.name, "Rex");
        assert!(req.breed.is_none());
        assert!(req.validate_input().is_ok());
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("phone_number"), "phoneNumber");
        assert_eq!(to_camel_case("email"), "email");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Normalized emails are trimmed, lowercase and stable under renormalization
        #[test]
        fn prop_normalize_email_idempotent(
            local in "[A-Za-z0-9]{1,12}",
            domain in "[A-Za-z]{1,10}",
            pad_left in " {0,3}",
            pad_right in " {0,3}",
        ) {
            let raw = format!("{}{}@{}.com{}", pad_left, local, domain, pad_right);
            let normalized = normalize_email(&raw);
            prop_assert_eq!(normalized.clone(), normalized.to_lowercase());
            prop_assert_eq!(normalized.trim(), normalized.as_str());
            prop_assert_eq!(normalize_email(&normalized), normalized.clone());
            prop_assert_eq!(normalize_email(&raw.to_uppercase()), normalized);
        }
    }
}
