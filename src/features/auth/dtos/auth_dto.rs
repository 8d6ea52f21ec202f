use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::modules::backend::UserProfile;
use crate::shared::validation::PHONE_REGEX;

/// Request DTO for user login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO for user registration
///
/// Passport number and expiry are only required when the visitor says they
/// hold a passport.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_registration"))]
pub struct RegisterRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(skip_serializing)]
    pub confirm_password: String,

    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[validate(regex(path = *PHONE_REGEX, message = "Invalid phone number"))]
    pub phone: String,

    #[serde(default)]
    pub gender: Option<String>,

    #[serde(default)]
    pub date_of_birth: Option<String>,

    #[serde(default)]
    pub nationality: Option<String>,

    #[serde(default)]
    pub has_passport: bool,

    #[serde(default)]
    pub passport_number: Option<String>,

    #[serde(default)]
    pub passport_expiry: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

fn validate_registration(dto: &RegisterRequestDto) -> Result<(), ValidationError> {
    if dto.password != dto.confirm_password {
        return Err(ValidationError::new("password_mismatch")
            .with_message("Passwords do not match".into()));
    }

    if dto.has_passport && is_blank(&dto.passport_number) {
        return Err(ValidationError::new("passport_number_required")
            .with_message("Passport number is required".into()));
    }

    if dto.has_passport && is_blank(&dto.passport_expiry) {
        return Err(ValidationError::new("passport_expiry_required")
            .with_message("Passport expiry date is required".into()));
    }

    Ok(())
}

/// The visitor's login state
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionUserDto {
    pub user: UserProfile,
    pub is_admin: bool,
}

impl SessionUserDto {
    pub fn new(user: UserProfile) -> Self {
        let is_admin = matches!(
            user.role.as_str(),
            crate::shared::constants::ROLE_ADMIN | crate::shared::constants::ROLE_SUPER_ADMIN
        );
        Self { user, is_admin }
    }
}
