use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::package::PackageStatus;

/// Label recorded for scans with no resolvable user.
pub const ANONYMOUS_LABEL: &str = "Anonymous (guest)";

/// One entry in a scan's history trail.
/// Stored as a JSON array on the scan row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HistoryEntry {
    pub at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_status: Option<PackageStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scan")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Display label of whoever scanned: "{name} ({role})" for resolved
    /// users, "Anonymous (guest)" otherwise.
    pub scanned_by: String,
    /// GhanaPost GPS code or free-form coordinates.
    pub location: Option<String>,
    pub status: PackageStatus,
    /// Ordered history of prior values, as JSON array of [`HistoryEntry`].
    #[sea_orm(column_type = "JsonBinary")]
    pub history: Json,

    pub package_id: i32,
    #[sea_orm(belongs_to, from = "package_id", to = "id")]
    pub package: HasOne<super::package::Entity>,

    /// NULL for anonymous scans.
    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
