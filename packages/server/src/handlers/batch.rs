use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{batch, farmer};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::batch::*;
use crate::models::shared::{ListQuery, apply_list_params, parse_list_query};
use crate::state::AppState;
use crate::utils::{codes, geocode};

#[utoipa::path(
    post,
    path = "/",
    tag = "Batches",
    operation_id = "createBatch",
    summary = "Create a harvest batch",
    description = "Creates a batch against a farmer, owned by the caller. The GhanaPost-style \
        gps_address and the unique batch_code are derived here, before the insert, and are never \
        regenerated afterwards.",
    request_body = CreateBatchRequest,
    responses(
        (status = 201, description = "Batch created", body = BatchEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Farmer not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_batch(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_batch(&payload)?;

    farmer::Entity::find_by_id(payload.farmer_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Farmer not found".into()))?;

    // Explicit derivation step, not a storage-layer hook: code and geocode
    // exist before the row does.
    let gps_address = geocode::derive(
        payload.latitude,
        payload.longitude,
        payload.collection_location.trim(),
    );
    let batch_code = codes::batch_code();

    let now = chrono::Utc::now();
    let new_batch = batch::ActiveModel {
        crop_type: Set(payload.crop_type.trim().to_string()),
        quantity: Set(payload.quantity),
        collection_location: Set(payload.collection_location.trim().to_string()),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        gps_address: Set(gps_address),
        batch_code: Set(batch_code),
        farmer_id: Set(payload.farmer_id),
        user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_batch.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(BatchEnvelope {
            message: "Batch created successfully".into(),
            batch: model.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Batches",
    operation_id = "listBatches",
    summary = "List batches",
    description = "Returns batches matching the optional filter, with the source farmer expanded. \
        Pagination defaults and caps are configured, not contractual.",
    params(ListQuery),
    responses(
        (status = 200, description = "List of batches", body = BatchesEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Malformed filter/sort (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_batches(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<BatchesEnvelope>, AppError> {
    let params = parse_list_query(&query, &state.config.pagination)?;
    let select = apply_list_params(batch::Entity::find(), &params, batch_column)?;

    let rows = select.find_also_related(farmer::Entity).all(&state.db).await?;

    let batches = rows
        .into_iter()
        .map(|(b, f)| BatchResponse::from(b).with_farmer(f))
        .collect();

    Ok(Json(BatchesEnvelope {
        message: "Batches retrieved".into(),
        batches,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Batches",
    operation_id = "getBatch",
    summary = "Get a batch by ID",
    params(("id" = i32, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch details", body = BatchEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Batch not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_batch(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BatchEnvelope>, AppError> {
    let (model, farmer) = batch::Entity::find_by_id(id)
        .find_also_related(farmer::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch not found".into()))?;

    Ok(Json(BatchEnvelope {
        message: "Batch retrieved".into(),
        batch: BatchResponse::from(model).with_farmer(farmer),
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Batches",
    operation_id = "updateBatch",
    summary = "Update a batch",
    description = "Partially updates a batch. Only the owner or an admin may update. batch_code and \
        gps_address are never touched by updates.",
    params(("id" = i32, Path, description = "Batch ID")),
    request_body = UpdateBatchRequest,
    responses(
        (status = 200, description = "Batch updated", body = BatchEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Batch not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_batch(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBatchRequest>,
) -> Result<Json<BatchEnvelope>, AppError> {
    validate_update_batch(&payload)?;

    let existing = find_batch(&state.db, id).await?;
    auth_user.require_owner_or_admin(existing.user_id)?;

    if payload == UpdateBatchRequest::default() {
        return Ok(Json(BatchEnvelope {
            message: "Batch updated successfully".into(),
            batch: existing.into(),
        }));
    }

    if let Some(farmer_id) = payload.farmer_id {
        farmer::Entity::find_by_id(farmer_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Farmer not found".into()))?;
    }

    let mut active: batch::ActiveModel = existing.into();

    if let Some(farmer_id) = payload.farmer_id {
        active.farmer_id = Set(farmer_id);
    }
    if let Some(ref crop_type) = payload.crop_type {
        active.crop_type = Set(crop_type.trim().to_string());
    }
    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(ref location) = payload.collection_location {
        active.collection_location = Set(location.trim().to_string());
    }
    if let Some(latitude) = payload.latitude {
        active.latitude = Set(Some(latitude));
    }
    if let Some(longitude) = payload.longitude {
        active.longitude = Set(Some(longitude));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;

    Ok(Json(BatchEnvelope {
        message: "Batch updated successfully".into(),
        batch: model.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Batches",
    operation_id = "deleteBatch",
    summary = "Delete a batch",
    description = "Hard-deletes a batch. Existing packages keep their batch_id and are left \
        dangling; depletion is one-way and nothing is restored.",
    params(("id" = i32, Path, description = "Batch ID")),
    responses(
        (status = 200, description = "Batch deleted", body = BatchEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Batch not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_batch(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BatchEnvelope>, AppError> {
    let existing = find_batch(&state.db, id).await?;
    auth_user.require_owner_or_admin(existing.user_id)?;

    let response = BatchResponse::from(existing.clone());
    let active: batch::ActiveModel = existing.into();
    active.delete(&state.db).await?;

    Ok(Json(BatchEnvelope {
        message: "Batch deleted successfully".into(),
        batch: response,
    }))
}

async fn find_batch<C: ConnectionTrait>(db: &C, id: i32) -> Result<batch::Model, AppError> {
    batch::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch not found".into()))
}

/// Depletion applied when a package is cut from a batch. Clamped at zero,
/// never negative.
pub fn depleted_quantity(current: f64, weight: f64) -> f64 {
    (current - weight).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depletion_clamps_at_zero() {
        // quantity=100: -30 => 70, then -80 => 0 (not -10)
        let q = depleted_quantity(100.0, 30.0);
        assert_eq!(q, 70.0);
        assert_eq!(depleted_quantity(q, 80.0), 0.0);
    }

    #[test]
    fn depletion_of_exact_remainder_is_zero() {
        assert_eq!(depleted_quantity(50.0, 50.0), 0.0);
    }
}
