use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{EmailJob, EmailKind};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user::{self, DEFAULT_ROLE};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, MaybeAuthUser};
use crate::extractors::json::AppJson;
use crate::models::shared::{ListQuery, apply_list_params, parse_list_query};
use crate::models::user::*;
use crate::state::AppState;
use crate::utils::{hash, jwt, notify};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Users",
    operation_id = "registerUser",
    summary = "Register an account",
    description = "Open registration. A `role` in the payload is honored only when the caller is \
        an authenticated admin; self registrations always get the default role, and admin-created \
        accounts record the creating admin in `created_by`. A confirmation email is enqueued \
        fire-and-forget.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserEnvelope),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, principal, payload))]
pub async fn register(
    MaybeAuthUser(principal): MaybeAuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let email = payload.email.trim().to_lowercase();

    let taken = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .is_some();
    if taken {
        return Err(AppError::EmailTaken);
    }

    let admin = principal.filter(|p| p.is_admin());
    let role = match (&admin, payload.role) {
        (Some(_), Some(role)) => role,
        _ => DEFAULT_ROLE.to_string(),
    };

    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let now = chrono::Utc::now();
    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password: Set(password),
        contact: Set(payload.contact),
        avatar: Set(payload.avatar),
        role: Set(role),
        created_by: Set(admin.map(|a| a.user_id)),
        deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_user.insert(&state.db).await?;

    let job = EmailJob::new(
        model.email.clone(),
        EmailKind::Registration {
            name: model.name.clone(),
            role: model.role.clone(),
            login_url: format!("{}/login", state.config.client.frontend_url),
        },
    );
    notify::enqueue_email(&state, job).await;

    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            message: "User registered successfully".into(),
            user: model.into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Users",
    operation_id = "login",
    summary = "Log in",
    description = "Exchanges email + password for a 24-hour session token. A soft-deleted account \
        is indistinguishable from a missing one.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginEnvelope),
        (status = 401, description = "Wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Unknown or deleted email (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginEnvelope>, AppError> {
    validate_login_request(&payload)?;

    let email = payload.email.trim().to_lowercase();
    let model = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .filter(user::Column::Deleted.eq(false))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let ok = hash::verify_password(&payload.password, &model.password)
        .map_err(|e| AppError::Internal(format!("password verification failed: {e}")))?;
    if !ok {
        return Err(AppError::InvalidCredentials);
    }

    let access_token = jwt::sign_session(model.id, &model.role, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(LoginEnvelope {
        message: "Login successful".into(),
        access_token,
        user: model.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getProfile",
    summary = "Get the caller's profile",
    responses(
        (status = 200, description = "Profile", body = UserEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserEnvelope>, AppError> {
    let model = find_user(&state.db, auth_user.user_id).await?;
    Ok(Json(UserEnvelope {
        message: "Profile retrieved".into(),
        user: model.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user by ID",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User details", body = UserEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_user(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserEnvelope>, AppError> {
    let model = find_user(&state.db, id).await?;
    Ok(Json(UserEnvelope {
        message: "User retrieved".into(),
        user: model.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users (admin)",
    params(ListQuery),
    responses(
        (status = 200, description = "List of users, passwords excluded", body = UsersEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 422, description = "Malformed filter/sort (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UsersEnvelope>, AppError> {
    auth_user.require_admin()?;

    let params = parse_list_query(&query, &state.config.pagination)?;
    let select = apply_list_params(user::Entity::find(), &params, user_column)?;
    let users = select.all(&state.db).await?;

    Ok(Json(UsersEnvelope {
        message: "Users retrieved".into(),
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Users",
    operation_id = "updateProfile",
    summary = "Update the caller's profile",
    description = "name/contact/avatar/password only; a new password is re-hashed. Role changes \
        go through the admin endpoint.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserEnvelope>, AppError> {
    validate_update_profile(&payload)?;

    let existing = find_user(&state.db, auth_user.user_id).await?;
    let model = apply_user_update(
        &state.db,
        existing,
        payload.name,
        payload.contact,
        payload.avatar,
        payload.password,
        None,
    )
    .await?;

    Ok(Json(UserEnvelope {
        message: "Profile updated successfully".into(),
        user: model.into(),
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user (admin)",
    description = "Admin variant of the profile update; additionally may change the role.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AdminUpdateUserRequest>,
) -> Result<Json<UserEnvelope>, AppError> {
    auth_user.require_admin()?;
    validate_admin_update_user(&payload)?;

    let existing = find_user(&state.db, id).await?;
    let model = apply_user_update(
        &state.db,
        existing,
        payload.name,
        payload.contact,
        payload.avatar,
        payload.password,
        payload.role,
    )
    .await?;

    Ok(Json(UserEnvelope {
        message: "User updated successfully".into(),
        user: model.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/forgot-password",
    tag = "Users",
    operation_id = "forgotPassword",
    summary = "Request a password reset",
    description = "Signs a one-hour reset token and enqueues the reset email fire-and-forget. The \
        token is only ever delivered by mail, never in the response.",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email enqueued", body = MessageEnvelope),
        (status = 404, description = "Unknown email (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ForgotPasswordRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let email = payload.email.trim().to_lowercase();
    let model = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .filter(user::Column::Deleted.eq(false))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let token = jwt::sign_reset(model.id, &model.role, &state.config.auth.jwt_secret)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let job = EmailJob::new(
        model.email,
        EmailKind::PasswordReset {
            reset_url: format!(
                "{}/reset-password/{token}",
                state.config.client.frontend_url
            ),
        },
    );
    notify::enqueue_email(&state, job).await;

    Ok(Json(MessageEnvelope {
        message: "Password reset email sent".into(),
    }))
}

#[utoipa::path(
    post,
    path = "/reset-password/{token}",
    tag = "Users",
    operation_id = "resetPassword",
    summary = "Reset a password",
    description = "Consumes a reset-purpose token from the emailed link. Session tokens are \
        rejected here.",
    params(("token" = String, Path, description = "Reset token from the email link")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageEnvelope),
        (status = 401, description = "Expired or wrong-purpose token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, token, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    AppJson(payload): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    validate_password(&payload.password)?;

    let claims = jwt::verify_reset(&token, &state.config.auth.jwt_secret)
        .map_err(|_| AppError::TokenInvalid)?;

    let existing = find_user(&state.db, claims.uid).await?;

    let password = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;

    let mut active: user::ActiveModel = existing.into();
    active.password = Set(password);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&state.db).await?;

    Ok(Json(MessageEnvelope {
        message: "Password reset successful".into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Soft-delete a user (admin)",
    description = "Sets the soft-delete flag. The row and its owned resources stay; the account \
        can no longer log in until restored.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User soft-deleted", body = UserEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserEnvelope>, AppError> {
    auth_user.require_admin()?;
    let model = set_deleted(&state.db, id, true).await?;
    Ok(Json(UserEnvelope {
        message: "User deleted successfully".into(),
        user: model.into(),
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}/restore",
    tag = "Users",
    operation_id = "restoreUser",
    summary = "Restore a soft-deleted user (admin)",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User restored", body = UserEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn restore_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserEnvelope>, AppError> {
    auth_user.require_admin()?;
    let model = set_deleted(&state.db, id, false).await?;
    Ok(Json(UserEnvelope {
        message: "User restored successfully".into(),
        user: model.into(),
    }))
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn apply_user_update<C: ConnectionTrait>(
    db: &C,
    existing: user::Model,
    name: Option<String>,
    contact: Option<String>,
    avatar: Option<String>,
    password: Option<String>,
    role: Option<String>,
) -> Result<user::Model, AppError> {
    let mut active: user::ActiveModel = existing.into();

    if let Some(name) = name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(contact) = contact {
        active.contact = Set(Some(contact));
    }
    if let Some(avatar) = avatar {
        active.avatar = Set(Some(avatar));
    }
    if let Some(password) = password {
        let hashed = hash::hash_password(&password)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))?;
        active.password = Set(hashed);
    }
    if let Some(role) = role {
        active.role = Set(role);
    }
    active.updated_at = Set(chrono::Utc::now());

    Ok(active.update(db).await?)
}

async fn set_deleted<C: ConnectionTrait>(
    db: &C,
    id: i32,
    deleted: bool,
) -> Result<user::Model, AppError> {
    let existing = find_user(db, id).await?;
    let mut active: user::ActiveModel = existing.into();
    active.deleted = Set(deleted);
    active.updated_at = Set(chrono::Utc::now());
    Ok(active.update(db).await?)
}

/// Fields exposed to the admin list `filter`/`sort`. Password and email are
/// deliberately absent from the filter surface.
pub fn user_column(field: &str) -> Option<user::Column> {
    match field {
        "name" => Some(user::Column::Name),
        "role" => Some(user::Column::Role),
        "deleted" => Some(user::Column::Deleted),
        "created_by" => Some(user::Column::CreatedBy),
        "created_at" => Some(user::Column::CreatedAt),
        "updated_at" => Some(user::Column::UpdatedAt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    fn account(deleted: bool) -> user::Model {
        let now = chrono::Utc::now();
        user::Model {
            id: 9,
            name: "Ama Mensah".into(),
            email: "ama@example.com".into(),
            password: hash::hash_password("correct-horse").unwrap(),
            contact: None,
            avatar: None,
            role: "user".into(),
            created_by: None,
            deleted,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn soft_deleted_users_cannot_log_in() {
        // The login query filters deleted = false, so the mock returns no row.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let found = user::Entity::find()
            .filter(user::Column::Email.eq("ama@example.com"))
            .filter(user::Column::Deleted.eq(false))
            .one(&db)
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn soft_delete_flips_the_flag_only() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![account(false)]])
            .append_query_results([vec![account(true)]])
            .into_connection();

        let model = set_deleted(&db, 9, true).await.unwrap();
        assert!(model.deleted);
        assert_eq!(model.email, "ama@example.com");
    }

    #[test]
    fn email_filterability_is_locked_down() {
        assert!(user_column("email").is_none());
        assert!(user_column("password").is_none());
        assert!(user_column("role").is_some());
    }
}
