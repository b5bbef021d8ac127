use axum::{extract::FromRef, extract::FromRequestParts, http::request::Parts};

use crate::entity::user::ADMIN_ROLE;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated principal extracted from the `Authorization: Bearer <token>`
/// header.
///
/// Add this as a handler parameter to require authentication. Ownership
/// checks happen via `require_owner_or_admin()` in the handler body.
pub struct AuthUser {
    pub user_id: i32,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// The single mutation-authorization rule: admins may touch anything,
    /// everyone else only resources they own.
    pub fn can_modify(&self, owner_id: i32) -> bool {
        self.is_admin() || self.user_id == owner_id
    }

    /// Returns `Ok(())` if this principal may mutate a resource owned by
    /// `owner_id`, `Err(PermissionDenied)` otherwise. Callers must resolve
    /// the resource first so that a missing resource stays a 404.
    pub fn require_owner_or_admin(&self, owner_id: i32) -> Result<(), AppError> {
        if self.can_modify(owner_id) {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims = jwt::verify_session(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            role: claims.role,
        })
    }
}

/// Optional principal for routes that allow anonymous access (scan creation).
///
/// A missing `Authorization` header yields `MaybeAuthUser(None)`; a present
/// but invalid token is still rejected rather than silently downgraded.
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key("Authorization") {
            return Ok(MaybeAuthUser(None));
        }
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(MaybeAuthUser(Some(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: i32, role: &str) -> AuthUser {
        AuthUser {
            user_id: id,
            role: role.into(),
        }
    }

    #[test]
    fn owner_may_modify_own_resource() {
        assert!(principal(7, "user").require_owner_or_admin(7).is_ok());
    }

    #[test]
    fn admin_may_modify_any_resource() {
        assert!(principal(1, "admin").require_owner_or_admin(999).is_ok());
    }

    #[test]
    fn non_owner_non_admin_is_denied() {
        let err = principal(2, "user").require_owner_or_admin(7).unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
    }

    #[test]
    fn role_names_are_exact() {
        // "Admin" is not a role; the gate compares the stored lowercase role.
        assert!(!principal(1, "Admin").can_modify(999));
    }
}
