use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::{instrument, warn};

use crate::entity::scan::{ANONYMOUS_LABEL, HistoryEntry};
use crate::entity::{package, scan, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{AuthUser, MaybeAuthUser};
use crate::extractors::json::AppJson;
use crate::handlers::package::find_package;
use crate::models::scan::*;
use crate::models::shared::{ListQuery, apply_list_params, parse_list_query};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Scans",
    operation_id = "createScan",
    summary = "Record a scan event",
    description = "The one endpoint that accepts anonymous callers (consumers scanning a QR code). \
        Authenticated scans may move the package status; an anonymous scan has its status field \
        silently dropped and records the package's current status instead.",
    request_body = CreateScanRequest,
    responses(
        (status = 201, description = "Scan recorded", body = ScanEnvelope),
        (status = 401, description = "Bearer token present but invalid (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Package not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, principal, payload))]
pub async fn create_scan(
    MaybeAuthUser(principal): MaybeAuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateScanRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_scan(&payload)?;

    let target = find_package(&state.db, payload.package_id).await?;

    // Resolve the principal to a user row. A token whose user has since been
    // deleted degrades to an anonymous scan rather than failing.
    let scanner = match principal {
        Some(ref auth) => user::Entity::find_by_id(auth.user_id).one(&state.db).await?,
        None => None,
    };

    let scanned_by = match payload.scanned_by {
        Some(label) => label.trim().to_string(),
        None => scanner
            .as_ref()
            .map(|u| scanner_label(&u.name, &u.role))
            .unwrap_or_else(|| ANONYMOUS_LABEL.to_string()),
    };

    let status = effective_status(scanner.is_some(), payload.status, target.status);

    let now = chrono::Utc::now();
    let new_scan = scan::ActiveModel {
        scanned_by: Set(scanned_by),
        location: Set(payload.location.map(|l| l.trim().to_string())),
        status: Set(status),
        history: Set(serde_json::json!([])),
        package_id: Set(target.id),
        user_id: Set(scanner.as_ref().map(|u| u.id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_scan.insert(&state.db).await?;

    if let Some(status) = status_to_propagate(Some(model.status), target.status) {
        propagate_status(&state.db, target, status).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(ScanEnvelope {
            message: "Scan recorded successfully".into(),
            scan: ScanResponse::from(model).with_user(scanner),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Scans",
    operation_id = "listScans",
    summary = "List scans",
    params(ListQuery),
    responses(
        (status = 200, description = "List of scans with package and scanner expanded", body = ScansEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Malformed filter/sort (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_scans(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ScansEnvelope>, AppError> {
    let params = parse_list_query(&query, &state.config.pagination)?;
    let select = apply_list_params(scan::Entity::find(), &params, scan_column)?;

    let rows = select.find_also_related(package::Entity).all(&state.db).await?;
    let scanners = load_scanners(&state.db, rows.iter().filter_map(|(s, _)| s.user_id)).await?;

    let scans = rows
        .into_iter()
        .map(|(s, p)| {
            let scanner = s.user_id.and_then(|id| scanners.get(&id).cloned());
            ScanResponse::from(s).with_package(p).with_user(scanner)
        })
        .collect();

    Ok(Json(ScansEnvelope {
        message: "Scans retrieved".into(),
        scans,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Scans",
    operation_id = "getScan",
    summary = "Get a scan by ID",
    params(("id" = i32, Path, description = "Scan ID")),
    responses(
        (status = 200, description = "Scan details", body = ScanEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Scan not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_scan(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ScanEnvelope>, AppError> {
    let (model, target) = scan::Entity::find_by_id(id)
        .find_also_related(package::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Scan not found".into()))?;

    let scanner = match model.user_id {
        Some(uid) => user::Entity::find_by_id(uid).one(&state.db).await?,
        None => None,
    };

    Ok(Json(ScanEnvelope {
        message: "Scan retrieved".into(),
        scan: ScanResponse::from(model).with_package(target).with_user(scanner),
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Scans",
    operation_id = "updateScan",
    summary = "Correct a scan record",
    description = "Owner-or-admin; scans recorded anonymously have no owner and are admin-only. \
        The previous values are appended to the scan's history trail, and a status change \
        re-propagates to the referenced package.",
    params(("id" = i32, Path, description = "Scan ID")),
    request_body = UpdateScanRequest,
    responses(
        (status = 200, description = "Scan updated", body = ScanEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Scan not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_scan(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateScanRequest>,
) -> Result<Json<ScanEnvelope>, AppError> {
    validate_update_scan(&payload)?;

    let existing = find_scan(&state.db, id).await?;
    require_scan_access(&auth_user, &existing)?;

    // Only status/location corrections (and explicit notes) leave a trail;
    // relabeling scanned_by does not.
    let history = if payload.status.is_some() || payload.location.is_some() || payload.note.is_some()
    {
        let entry = HistoryEntry {
            at: chrono::Utc::now(),
            by: Some(auth_user.user_id),
            by_label: None,
            old_status: payload.status.map(|_| existing.status),
            old_location: payload.location.as_ref().and(existing.location.clone()),
            note: payload.note.clone(),
        };
        appended_history(&existing.history, entry)
    } else {
        existing.history.clone()
    };

    let package_id = existing.package_id;

    let mut active: scan::ActiveModel = existing.into();
    if let Some(ref label) = payload.scanned_by {
        active.scanned_by = Set(label.trim().to_string());
    }
    if let Some(ref location) = payload.location {
        active.location = Set(Some(location.trim().to_string()));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.history = Set(history);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;

    // A supplied status always re-asserts against the package's *current*
    // status, which may have diverged since this scan was recorded.
    if let Some(status) = payload.status
        && let Ok(target) = find_package(&state.db, package_id).await
        && let Some(status) = status_to_propagate(Some(status), target.status)
    {
        propagate_status(&state.db, target, status).await;
    }

    Ok(Json(ScanEnvelope {
        message: "Scan updated successfully".into(),
        scan: model.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Scans",
    operation_id = "deleteScan",
    summary = "Delete a scan",
    description = "Owner-or-admin; anonymous scans are admin-only. The referenced package keeps \
        whatever status the scan propagated.",
    params(("id" = i32, Path, description = "Scan ID")),
    responses(
        (status = 200, description = "Scan deleted", body = ScanEnvelope),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Scan not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_scan(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ScanEnvelope>, AppError> {
    let existing = find_scan(&state.db, id).await?;
    require_scan_access(&auth_user, &existing)?;

    let response = ScanResponse::from(existing.clone());
    let active: scan::ActiveModel = existing.into();
    active.delete(&state.db).await?;

    Ok(Json(ScanEnvelope {
        message: "Scan deleted successfully".into(),
        scan: response,
    }))
}

async fn find_scan<C: ConnectionTrait>(db: &C, id: i32) -> Result<scan::Model, AppError> {
    scan::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Scan not found".into()))
}

/// Anonymous scans have no owner, so only admins may touch them.
fn require_scan_access(auth_user: &AuthUser, existing: &scan::Model) -> Result<(), AppError> {
    match existing.user_id {
        Some(owner) => auth_user.require_owner_or_admin(owner),
        None => auth_user.require_admin(),
    }
}

/// Display label recorded for a resolved scanning user.
fn scanner_label(name: &str, role: &str) -> String {
    format!("{name} ({})", role.to_lowercase())
}

/// Anonymous callers cannot move a package's status: their requested status
/// is dropped and the package's current status is recorded instead.
fn effective_status(
    authenticated: bool,
    requested: Option<package::PackageStatus>,
    current: package::PackageStatus,
) -> package::PackageStatus {
    if authenticated {
        requested.unwrap_or(current)
    } else {
        current
    }
}

fn appended_history(history: &serde_json::Value, entry: HistoryEntry) -> serde_json::Value {
    let mut entries: Vec<HistoryEntry> =
        serde_json::from_value(history.clone()).unwrap_or_default();
    entries.push(entry);
    serde_json::to_value(entries).unwrap_or_else(|_| serde_json::json!([]))
}

/// Decide whether a scan status must be written through to the package. The
/// comparison is against the package's *current* status, not the scan's
/// previous one: a scan re-asserting its own status still overwrites a
/// package that a later scan has moved elsewhere.
fn status_to_propagate(
    requested: Option<package::PackageStatus>,
    package_current: package::PackageStatus,
) -> Option<package::PackageStatus> {
    requested.filter(|s| *s != package_current)
}

/// Best effort: the scan row is the source of truth for the event; a failed
/// package write is logged and the scan stands.
async fn propagate_status<C: ConnectionTrait>(
    db: &C,
    target: package::Model,
    status: package::PackageStatus,
) {
    let package_id = target.id;
    let mut active: package::ActiveModel = target.into();
    active.status = Set(status);
    active.updated_at = Set(chrono::Utc::now());
    if let Err(err) = active.update(db).await {
        warn!(package_id, error = %err, "failed to propagate scan status to package");
    }
}

async fn load_scanners<C, I>(db: &C, ids: I) -> Result<HashMap<i32, user::Model>, AppError>
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
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    use super::*;
    use crate::entity::package::PackageStatus;

    fn tracked_package(status: PackageStatus) -> package::Model {
        let now = chrono::Utc::now();
        package::Model {
            id: 4,
            weight: 25.0,
            package_code: "PKG-7-1-1".into(),
            qr_code: "https://traceability-app.com/package/4".into(),
            status,
            batch_id: 7,
            user_id: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn anonymous_status_is_dropped() {
        let status = effective_status(false, Some(PackageStatus::Sold), PackageStatus::Available);
        assert_eq!(status, PackageStatus::Available);
    }

    #[test]
    fn authenticated_status_wins() {
        let status = effective_status(true, Some(PackageStatus::InTransit), PackageStatus::Available);
        assert_eq!(status, PackageStatus::InTransit);
    }

    #[test]
    fn authenticated_without_status_keeps_current() {
        let status = effective_status(true, None, PackageStatus::Sold);
        assert_eq!(status, PackageStatus::Sold);
    }

    #[test]
    fn reasserted_status_still_overwrites_a_diverged_package() {
        // The scan said "sold"; a later scan moved the package to in-transit.
        // Re-asserting "sold" must write the package again.
        let status = status_to_propagate(Some(PackageStatus::Sold), PackageStatus::InTransit);
        assert_eq!(status, Some(PackageStatus::Sold));
    }

    #[test]
    fn matching_status_skips_the_package_write() {
        assert_eq!(
            status_to_propagate(Some(PackageStatus::Sold), PackageStatus::Sold),
            None
        );
        assert_eq!(status_to_propagate(None, PackageStatus::Available), None);
    }

    #[tokio::test]
    async fn propagation_writes_the_new_status() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![tracked_package(PackageStatus::Sold)]])
            .into_connection();

        propagate_status(&db, tracked_package(PackageStatus::Available), PackageStatus::Sold)
            .await;

        let log: Vec<Transaction> = db.into_transaction_log();
        let stmt = format!("{:?}", log[0]);
        assert!(stmt.contains("UPDATE"), "expected an update, got {stmt}");
        assert!(stmt.contains("sold"), "status value missing: {stmt}");
    }

    #[tokio::test]
    async fn propagation_failure_is_swallowed() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection lost".into())])
            .into_connection();

        // Must not panic or propagate; the scan row already stands.
        propagate_status(&db, tracked_package(PackageStatus::Available), PackageStatus::Sold)
            .await;
    }

    #[test]
    fn scanner_label_lowercases_role() {
        assert_eq!(scanner_label("Ama Mensah", "ADMIN"), "Ama Mensah (admin)");
    }

    #[test]
    fn history_appends_and_tolerates_garbage() {
        let entry = HistoryEntry {
            at: chrono::Utc::now(),
            by: Some(3),
            by_label: None,
            old_status: Some(PackageStatus::Available),
            old_location: None,
            note: Some("corrected location".into()),
        };

        let from_garbage = appended_history(&serde_json::json!("nonsense"), entry.clone());
        let entries: Vec<HistoryEntry> = serde_json::from_value(from_garbage).unwrap();
        assert_eq!(entries.len(), 1);

        let appended = appended_history(&serde_json::to_value(&entries).unwrap(), entry);
        let entries: Vec<HistoryEntry> = serde_json::from_value(appended).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn anonymous_scan_records_are_admin_only() {
        let admin = AuthUser {
            user_id: 1,
            role: "admin".into(),
        };
        let owner = AuthUser {
            user_id: 2,
            role: "user".into(),
        };

        let now = chrono::Utc::now();
        let anonymous = scan::Model {
            id: 1,
            scanned_by: ANONYMOUS_LABEL.into(),
            location: None,
            status: PackageStatus::Available,
            history: serde_json::json!([]),
            package_id: 1,
            user_id: None,
            created_at: now,
            updated_at: now,
        };
        let owned = scan::Model {
            user_id: Some(2),
            ..anonymous.clone()
        };

        assert!(require_scan_access(&admin, &anonymous).is_ok());
        assert!(require_scan_access(&owner, &anonymous).is_err());
        assert!(require_scan_access(&owner, &owned).is_ok());
    }
}
