use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{farmer, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::farmer::*;
use crate::models::shared::{ListQuery, apply_list_params, parse_list_query};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Farmers",
    operation_id = "registerFarmer",
    summary = "Register a farmer",
    description = "Registers a farmer under the calling field agent. Farmers are records, not \
        accounts; they never log in.",
    request_body = RegisterFarmerRequest,
    responses(
        (status = 201, description = "Farmer registered", body = FarmerEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn register_farmer(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterFarmerRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_farmer(&payload)?;

    let now = chrono::Utc::now();
    let new_farmer = farmer::ActiveModel {
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.map(|v| v.trim().to_string())),
        gender: Set(payload.gender),
        phone: Set(payload.phone),
        email: Set(payload.email.map(|v| v.trim().to_lowercase())),
        id_number: Set(payload.id_number),
        address: Set(payload.address.trim().to_string()),
        gps_address: Set(payload.gps_address),
        farm_size: Set(payload.farm_size.trim().to_string()),
        crop_type: Set(payload.crop_type.trim().to_string()),
        image: Set(payload.image),
        registered_at: Set(now),
        user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_farmer.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(FarmerEnvelope {
            message: "Farmer registered successfully".into(),
            farmer: model.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Farmers",
    operation_id = "listFarmers",
    summary = "List farmers",
    params(ListQuery),
    responses(
        (status = 200, description = "List of farmers with the registering user expanded", body = FarmersEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Malformed filter/sort (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_farmers(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<FarmersEnvelope>, AppError> {
    let params = parse_list_query(&query, &state.config.pagination)?;
    let select = apply_list_params(farmer::Entity::find(), &params, farmer_column)?;

    let rows = select.find_also_related(user::Entity).all(&state.db).await?;

    let farmers = rows
        .into_iter()
        .map(|(f, u)| FarmerResponse::from(f).with_user(u))
        .collect();

    Ok(Json(FarmersEnvelope {
        message: "Farmers retrieved".into(),
        farmers,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Farmers",
    operation_id = "getFarmer",
    summary = "Get a farmer by ID",
    params(("id" = i32, Path, description = "Farmer ID")),
    responses(
        (status = 200, description = "Farmer details", body = FarmerEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Farmer not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_farmer(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FarmerEnvelope>, AppError> {
    let (model, registrar) = farmer::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Farmer not found".into()))?;

    Ok(Json(FarmerEnvelope {
        message: "Farmer retrieved".into(),
        farmer: FarmerResponse::from(model).with_user(registrar),
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Farmers",
    operation_id = "updateFarmer",
    summary = "Update a farmer",
    description = "Owner-or-admin. Unlike batches, a farmer's gps_address is plain client data \
        and freely updatable.",
    params(("id" = i32, Path, description = "Farmer ID")),
    request_body = UpdateFarmerRequest,
    responses(
        (status = 200, description = "Farmer updated", body = FarmerEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Farmer not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_farmer(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateFarmerRequest>,
) -> Result<Json<FarmerEnvelope>, AppError> {
    validate_update_farmer(&payload)?;

    let existing = find_farmer(&state.db, id).await?;
    auth_user.require_owner_or_admin(existing.user_id)?;

    let mut active: farmer::ActiveModel = existing.into();

    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(Some(last_name.trim().to_string()));
    }
    if let Some(gender) = payload.gender {
        active.gender = Set(Some(gender));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(email) = payload.email {
        active.email = Set(Some(email.trim().to_lowercase()));
    }
    if let Some(id_number) = payload.id_number {
        active.id_number = Set(Some(id_number));
    }
    if let Some(address) = payload.address {
        active.address = Set(address.trim().to_string());
    }
    if let Some(gps_address) = payload.gps_address {
        active.gps_address = Set(Some(gps_address));
    }
    if let Some(farm_size) = payload.farm_size {
        active.farm_size = Set(farm_size.trim().to_string());
    }
    if let Some(crop_type) = payload.crop_type {
        active.crop_type = Set(crop_type.trim().to_string());
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;

    Ok(Json(FarmerEnvelope {
        message: "Farmer updated successfully".into(),
        farmer: model.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Farmers",
    operation_id = "deleteFarmer",
    summary = "Delete a farmer",
    description = "Hard-deletes a farmer record. Batches referencing it keep their farmer_id.",
    params(("id" = i32, Path, description = "Farmer ID")),
    responses(
        (status = 200, description = "Farmer deleted", body = FarmerEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Farmer not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_farmer(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FarmerEnvelope>, AppError> {
    let existing = find_farmer(&state.db, id).await?;
    auth_user.require_owner_or_admin(existing.user_id)?;

    let response = FarmerResponse::from(existing.clone());
    let active: farmer::ActiveModel = existing.into();
    active.delete(&state.db).await?;

    Ok(Json(FarmerEnvelope {
        message: "Farmer deleted successfully".into(),
        farmer: response,
    }))
}

async fn find_farmer<C: ConnectionTrait>(db: &C, id: i32) -> Result<farmer::Model, AppError> {
    farmer::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Farmer not found".into()))
}
