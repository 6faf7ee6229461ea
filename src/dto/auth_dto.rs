use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 8, max = 255))]
    pub password: String,
    #[validate(must_match(other = "password"))]
    pub password_confirmation: String,
    #[validate(custom(function = "validate_registrable_role"))]
    pub role: String,
}

fn validate_registrable_role(role: &str) -> Result<(), validator::ValidationError> {
    match role {
        "candidate" | "recruiter" => Ok(()),
        _ => Err(crate::utils::validation::error_with_message(
            "in",
            "The role must be either candidate or recruiter.",
        )),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordPayload {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(length(min = 8, max = 255))]
    pub password: String,
    #[validate(must_match(other = "password"))]
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: User,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(role: &str, confirmation: &str) -> RegisterPayload {
        RegisterPayload {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "s3cret-pass".into(),
            password_confirmation: confirmation.into(),
            role: role.into(),
        }
    }

    #[test]
    fn admin_cannot_self_register() {
        assert!(register("candidate", "s3cret-pass").validate().is_ok());
        assert!(register("recruiter", "s3cret-pass").validate().is_ok());
        assert!(register("admin", "s3cret-pass").validate().is_err());
    }

    #[test]
    fn confirmation_must_match() {
        let errors = register("candidate", "other-pass").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password_confirmation"));
    }
}
