use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::package::PackageResponse;
use super::user::UserResponse;
use crate::entity::package::PackageStatus;
use crate::entity::scan::{self, HistoryEntry};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateScanRequest {
    pub package_id: i32,
    pub location: Option<String>,
    /// Ignored (silently dropped) on anonymous scans.
    pub status: Option<PackageStatus>,
    /// Explicit label override; derived from the principal when absent.
    pub scanned_by: Option<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateScanRequest {
    pub location: Option<String>,
    pub scanned_by: Option<String>,
    /// A status change here re-propagates to the referenced package.
    pub status: Option<PackageStatus>,
    /// Optional note recorded in the history trail.
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScanResponse {
    pub id: i32,
    pub scanned_by: String,
    pub location: Option<String>,
    pub status: PackageStatus,
    pub history: Vec<HistoryEntry>,
    pub package_id: i32,
    /// Referenced package, expanded on list/get.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageResponse>,
    pub user_id: Option<i32>,
    /// Scanning user where one exists. Password excluded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<scan::Model> for ScanResponse {
    fn from(m: scan::Model) -> Self {
        // A malformed history blob is treated as empty rather than failing
        // the whole read.
        let history = serde_json::from_value(m.history).unwrap_or_default();
        Self {
            id: m.id,
            scanned_by: m.scanned_by,
            location: m.location,
            status: m.status,
            history,
            package_id: m.package_id,
            package: None,
            user_id: m.user_id,
            user: None,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl ScanResponse {
    pub fn with_package(mut self, package: Option<crate::entity::package::Model>) -> Self {
        self.package = package.map(PackageResponse::from);
        self
    }

    pub fn with_user(mut self, user: Option<crate::entity::user::Model>) -> Self {
        self.user = user.map(UserResponse::from);
        self
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScanEnvelope {
    pub message: String,
    pub scan: ScanResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScansEnvelope {
    pub message: String,
    pub scans: Vec<ScanResponse>,
}

// ---------------------------------------------------------------------------
// Validation and column whitelist
// ---------------------------------------------------------------------------

pub fn validate_create_scan(req: &CreateScanRequest) -> Result<(), AppError> {
    if let Some(ref label) = req.scanned_by
        && label.trim().is_empty()
    {
        return Err(AppError::Validation("scanned_by must not be blank".into()));
    }
    Ok(())
}

pub fn validate_update_scan(req: &UpdateScanRequest) -> Result<(), AppError> {
    if let Some(ref label) = req.scanned_by
        && label.trim().is_empty()
    {
        return Err(AppError::Validation("scanned_by must not be blank".into()));
    }
    Ok(())
}

pub fn scan_column(field: &str) -> Option<scan::Column> {
    match field {
        "scanned_by" => Some(scan::Column::ScannedBy),
        "location" => Some(scan::Column::Location),
        "status" => Some(scan::Column::Status),
        "package_id" => Some(scan::Column::PackageId),
        "user_id" => Some(scan::Column::UserId),
        "created_at" => Some(scan::Column::CreatedAt),
        "updated_at" => Some(scan::Column::UpdatedAt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_label_is_rejected() {
        let req = CreateScanRequest {
            package_id: 1,
            location: None,
            status: None,
            scanned_by: Some("   ".into()),
        };
        assert!(validate_create_scan(&req).is_err());
    }

    #[test]
    fn history_survives_malformed_blobs() {
        let model = scan::Model {
            id: 1,
            scanned_by: "Ama (user)".into(),
            location: None,
            status: PackageStatus::Available,
            history: serde_json::json!({"not": "an array"}),
            package_id: 2,
            user_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let resp = ScanResponse::from(model);
        assert!(resp.history.is_empty());
    }
}
