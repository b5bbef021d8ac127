use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Traceability status of a package, projected from authorized scans.
///
/// Transitions are deliberately unconstrained: the scan log is
/// append-permissive and any authorized scan may assert any status.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PackageStatus {
    #[default]
    #[sea_orm(string_value = "available")]
    #[serde(rename = "available")]
    Available,
    #[sea_orm(string_value = "sold")]
    #[serde(rename = "sold")]
    Sold,
    #[sea_orm(string_value = "in-transit")]
    #[serde(rename = "in-transit")]
    InTransit,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "package")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Weight cut from the parent batch; depletes batch quantity on creation.
    pub weight: f64,
    /// Assigned exactly once at creation: PKG-{batch_id}-{millis}-{rand}.
    #[sea_orm(unique)]
    pub package_code: String,
    /// Tracking URL embedding the package id, assigned once after insert.
    pub qr_code: String,
    pub status: PackageStatus,

    pub batch_id: i32,
    #[sea_orm(belongs_to, from = "batch_id", to = "id")]
    pub batch: HasOne<super::batch::Entity>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub scans: HasMany<super::scan::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
