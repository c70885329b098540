use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::repo_types::{Role, UserStatus};
use crate::validation::{normalized_email, not_null, patch_min_chars, Patch};

/// Body of `POST /user/create`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default, deserialize_with = "normalized_email")]
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub status: Option<UserStatus>,
}

impl CreateUserRequest {
    pub fn role(&self) -> Role {
        self.role.unwrap_or(Role::User)
    }

    /// Accounts made by an admin skip email activation.
    pub fn status(&self) -> UserStatus {
        self.status.unwrap_or(UserStatus::Active)
    }
}

/// Body of `PATCH /user/update/:id`. Email is not updatable.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[validate(custom(function = "name_patch"))]
    pub name: Patch<String>,
    #[serde(default)]
    #[validate(custom(function = "password_patch"))]
    pub password: Patch<String>,
    #[serde(default)]
    #[validate(custom(function = "not_null"))]
    pub role: Patch<Role>,
    #[serde(default)]
    #[validate(custom(function = "not_null"))]
    pub status: Patch<UserStatus>,
}

fn name_patch(value: &Patch<String>) -> Result<(), ValidationError> {
    patch_min_chars(value, 1, "Name is required")
}

fn password_patch(value: &Patch<String>) -> Result<(), ValidationError> {
    patch_min_chars(value, 8, "Password must be at least 8 characters")
}

impl UpdateUserRequest {
    pub fn touches_privileges(&self) -> bool {
        !self.role.is_undefined() || !self.status.is_undefined()
    }
}

/// Query of `GET /user/getEmail`.
#[derive(Debug, Deserialize, Validate)]
pub struct EmailQuery {
    #[serde(default, deserialize_with = "normalized_email")]
    #[validate(email(message = "Invalid email"))]
    pub email: String,
}
