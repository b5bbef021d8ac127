use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{validate_email, validate_required};
use crate::entity::user;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub contact: Option<String>,
    pub avatar: Option<String>,
    /// Honored only when the caller is an authenticated admin; self
    /// registrations always get the default role.
    pub role: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct AdminUpdateUserRequest {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub avatar: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ResetPasswordRequest {
    pub password: String,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

/// Public projection of a user. The password hash never leaves the entity
/// layer through this type.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub contact: Option<String>,
    pub avatar: Option<String>,
    pub role: String,
    pub created_by: Option<i32>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            contact: m.contact,
            avatar: m.avatar,
            role: m.role,
            created_by: m.created_by,
            deleted: m.deleted,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserEnvelope {
    pub message: String,
    pub user: UserResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UsersEnvelope {
    pub message: String,
    pub users: Vec<UserResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginEnvelope {
    pub message: String,
    pub access_token: String,
    pub user: UserResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageEnvelope {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_register_request(req: &RegisterRequest) -> Result<(), AppError> {
    validate_required(&req.name, "name")?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    if let Some(ref role) = req.role {
        validate_role(role)?;
    }
    Ok(())
}

pub fn validate_login_request(req: &LoginRequest) -> Result<(), AppError> {
    validate_email(&req.email)?;
    validate_required(&req.password, "password")?;
    Ok(())
}

pub fn validate_update_profile(req: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_required(name, "name")?;
    }
    if let Some(ref password) = req.password {
        validate_password(password)?;
    }
    Ok(())
}

pub fn validate_admin_update_user(req: &AdminUpdateUserRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_required(name, "name")?;
    }
    if let Some(ref password) = req.password {
        validate_password(password)?;
    }
    if let Some(ref role) = req.role {
        validate_role(role)?;
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<(), AppError> {
    if role != user::DEFAULT_ROLE && role != user::ADMIN_ROLE {
        return Err(AppError::Validation(
            "role must be one of: user, admin".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_valid_email_and_password() {
        let req = RegisterRequest {
            name: "Ama".into(),
            email: "not-an-email".into(),
            password: "longenough".into(),
            contact: None,
            avatar: None,
            role: None,
        };
        assert!(validate_register_request(&req).is_err());

        let req = RegisterRequest {
            email: "ama@example.com".into(),
            password: "short".into(),
            ..req
        };
        assert!(validate_register_request(&req).is_err());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        assert!(validate_role("superadmin").is_err());
        assert!(validate_role("admin").is_ok());
        assert!(validate_role("user").is_ok());
    }
}
