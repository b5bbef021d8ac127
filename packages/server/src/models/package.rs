use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::batch::BatchResponse;
use super::shared::validate_min_one;
use super::user::UserResponse;
use crate::entity::package::{self, PackageStatus};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePackageRequest {
    pub batch_id: i32,
    pub weight: f64,
}

/// Partial update. Codes and status are not client-writable here: codes are
/// assigned once, and status only moves through scans.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdatePackageRequest {
    pub weight: Option<f64>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct PackageResponse {
    pub id: i32,
    pub weight: f64,
    pub package_code: String,
    pub qr_code: String,
    pub status: PackageStatus,
    pub batch_id: i32,
    /// Parent batch, expanded on list/get.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchResponse>,
    pub user_id: i32,
    /// Owning user, expanded on list/get. Password excluded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<package::Model> for PackageResponse {
    fn from(m: package::Model) -> Self {
        Self {
            id: m.id,
            weight: m.weight,
            package_code: m.package_code,
            qr_code: m.qr_code,
            status: m.status,
            batch_id: m.batch_id,
            batch: None,
            user_id: m.user_id,
            user: None,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl PackageResponse {
    pub fn with_batch(mut self, batch: Option<crate::entity::batch::Model>) -> Self {
        self.batch = batch.map(BatchResponse::from);
        self
    }

    pub fn with_user(mut self, user: Option<crate::entity::user::Model>) -> Self {
        self.user = user.map(UserResponse::from);
        self
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PackageEnvelope {
    pub message: String,
    pub package: PackageResponse,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PackagesEnvelope {
    pub message: String,
    pub packages: Vec<PackageResponse>,
}

// ---------------------------------------------------------------------------
// Validation and column whitelist
// ---------------------------------------------------------------------------

pub fn validate_create_package(req: &CreatePackageRequest) -> Result<(), AppError> {
    validate_min_one(req.weight, "weight")
}

pub fn validate_update_package(req: &UpdatePackageRequest) -> Result<(), AppError> {
    if let Some(weight) = req.weight {
        validate_min_one(weight, "weight")?;
    }
    Ok(())
}

pub fn package_column(field: &str) -> Option<package::Column> {
    match field {
        "weight" => Some(package::Column::Weight),
        "package_code" => Some(package::Column::PackageCode),
        "status" => Some(package::Column::Status),
        "batch_id" => Some(package::Column::BatchId),
        "user_id" => Some(package::Column::UserId),
        "created_at" => Some(package::Column::CreatedAt),
        "updated_at" => Some(package::Column::UpdatedAt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_must_be_at_least_one() {
        assert!(validate_create_package(&CreatePackageRequest { batch_id: 1, weight: 0.9 }).is_err());
        assert!(validate_create_package(&CreatePackageRequest { batch_id: 1, weight: 1.0 }).is_ok());
    }

    #[test]
    fn qr_code_is_not_filterable() {
        assert!(package_column("qr_code").is_none());
        assert!(package_column("package_code").is_some());
    }
}
