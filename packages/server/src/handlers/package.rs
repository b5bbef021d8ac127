use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::{instrument, warn};

use crate::entity::{batch, package, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::batch::depleted_quantity;
use crate::models::package::*;
use crate::models::shared::{ListQuery, apply_list_params, parse_list_query};
use crate::state::AppState;
use crate::utils::codes;

#[utoipa::path(
    post,
    path = "/",
    tag = "Packages",
    operation_id = "createPackage",
    summary = "Cut a package from a batch",
    description = "Creates a package, stamps its package_code and tracking qr_code, then depletes \
        the source batch by the package weight (clamped at zero). The depletion is a separate \
        best-effort write: if it fails the package still exists.",
    request_body = CreatePackageRequest,
    responses(
        (status = 201, description = "Package created", body = PackageEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Batch not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_package(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_package(&payload)?;

    let source = batch::Entity::find_by_id(payload.batch_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch not found".into()))?;

    let now = chrono::Utc::now();
    let new_package = package::ActiveModel {
        weight: Set(payload.weight),
        package_code: Set(codes::package_code(payload.batch_id)),
        // Filled in right after insert, once the ID is known.
        qr_code: Set(String::new()),
        status: Set(package::PackageStatus::Available),
        batch_id: Set(payload.batch_id),
        user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = new_package.insert(&state.db).await?;

    let id = inserted.id;
    let mut stamped: package::ActiveModel = inserted.into();
    stamped.qr_code = Set(codes::tracking_url(
        &state.config.client.tracking_base_url,
        id,
    ));
    let model = stamped.update(&state.db).await?;

    deplete_batch(&state.db, source, payload.weight).await;

    Ok((
        StatusCode::CREATED,
        Json(PackageEnvelope {
            message: "Package created successfully".into(),
            package: model.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Packages",
    operation_id = "listPackages",
    summary = "List packages",
    params(ListQuery),
    responses(
        (status = 200, description = "List of packages with batch and owner expanded", body = PackagesEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Malformed filter/sort (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_packages(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PackagesEnvelope>, AppError> {
    let params = parse_list_query(&query, &state.config.pagination)?;
    let select = apply_list_params(package::Entity::find(), &params, package_column)?;

    let rows = select.find_also_related(batch::Entity).all(&state.db).await?;
    let owners = load_owners(&state.db, rows.iter().map(|(p, _)| p.user_id)).await?;

    let packages = rows
        .into_iter()
        .map(|(p, b)| {
            let owner = owners.get(&p.user_id).cloned();
            PackageResponse::from(p).with_batch(b).with_user(owner)
        })
        .collect();

    Ok(Json(PackagesEnvelope {
        message: "Packages retrieved".into(),
        packages,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Packages",
    operation_id = "getPackage",
    summary = "Get a package by ID",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package details", body = PackageEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Package not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_package(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PackageEnvelope>, AppError> {
    let (model, source) = package::Entity::find_by_id(id)
        .find_also_related(batch::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Package not found".into()))?;

    let owner = user::Entity::find_by_id(model.user_id).one(&state.db).await?;

    Ok(Json(PackageEnvelope {
        message: "Package retrieved".into(),
        package: PackageResponse::from(model).with_batch(source).with_user(owner),
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Packages",
    operation_id = "updatePackage",
    summary = "Update a package",
    description = "Owner-or-admin. Only the weight is client-writable; a weight change does not \
        retroactively adjust the batch depletion.",
    params(("id" = i32, Path, description = "Package ID")),
    request_body = UpdatePackageRequest,
    responses(
        (status = 200, description = "Package updated", body = PackageEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Package not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_package(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdatePackageRequest>,
) -> Result<Json<PackageEnvelope>, AppError> {
    validate_update_package(&payload)?;

    let existing = find_package(&state.db, id).await?;
    auth_user.require_owner_or_admin(existing.user_id)?;

    if payload == UpdatePackageRequest::default() {
        return Ok(Json(PackageEnvelope {
            message: "Package updated successfully".into(),
            package: existing.into(),
        }));
    }

    let mut active: package::ActiveModel = existing.into();
    if let Some(weight) = payload.weight {
        active.weight = Set(weight);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;

    Ok(Json(PackageEnvelope {
        message: "Package updated successfully".into(),
        package: model.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Packages",
    operation_id = "deletePackage",
    summary = "Delete a package",
    description = "Hard-deletes a package. Scans referencing it are left in place, and the batch \
        quantity is not restored.",
    params(("id" = i32, Path, description = "Package ID")),
    responses(
        (status = 200, description = "Package deleted", body = PackageEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Package not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_package(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PackageEnvelope>, AppError> {
    let existing = find_package(&state.db, id).await?;
    auth_user.require_owner_or_admin(existing.user_id)?;

    let response = PackageResponse::from(existing.clone());
    let active: package::ActiveModel = existing.into();
    active.delete(&state.db).await?;

    Ok(Json(PackageEnvelope {
        message: "Package deleted successfully".into(),
        package: response,
    }))
}

pub(crate) async fn find_package<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<package::Model, AppError> {
    package::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Package not found".into()))
}

/// Best effort: a failed depletion is logged, never surfaced. The package
/// write has already happened and stands on its own.
async fn deplete_batch<C: ConnectionTrait>(db: &C, source: batch::Model, weight: f64) {
    let batch_id = source.id;
    let remaining = depleted_quantity(source.quantity, weight);
    let mut active: batch::ActiveModel = source.into();
    active.quantity = Set(remaining);
    active.updated_at = Set(chrono::Utc::now());
    if let Err(err) = active.update(db).await {
        warn!(batch_id, error = %err, "failed to deplete batch after package creation");
    }
}

async fn load_owners<C, I>(db: &C, ids: I) -> Result<HashMap<i32, user::Model>, AppError>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = i32>,
{
    let ids: Vec<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};

    use super::*;

    fn maize_batch(quantity: f64) -> batch::Model {
        let now = chrono::Utc::now();
        batch::Model {
            id: 7,
            crop_type: "Maize".into(),
            quantity,
            collection_location: "Madina".into(),
            latitude: None,
            longitude: None,
            gps_address: "GA-123-4567".into(),
            batch_code: "BATCH-1-1".into(),
            farmer_id: 1,
            user_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn depletion_writes_clamped_quantity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![maize_batch(0.0)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        deplete_batch(&db, maize_batch(10.0), 25.0).await;

        let log: Vec<Transaction> = db.into_transaction_log();
        // One UPDATE carrying the clamped value, not a negative quantity.
        let stmt = format!("{:?}", log[0]);
        assert!(stmt.contains("UPDATE"), "expected an update, got {stmt}");
        assert!(!stmt.contains("-15"), "quantity must clamp at zero: {stmt}");
    }

    #[tokio::test]
    async fn depletion_failure_is_swallowed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection lost".into())])
            .into_connection();

        // Must not panic or propagate.
        deplete_batch(&db, maize_batch(10.0), 2.0).await;
    }
}
