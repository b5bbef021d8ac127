use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batch")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub crop_type: String,
    /// Remaining harvest quantity. Depleted by package creation, clamped at 0,
    /// never negative.
    pub quantity: f64,
    pub collection_location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// GhanaPost-style code derived once at creation and never recomputed.
    pub gps_address: String,
    /// Human-readable code assigned exactly once at first persistence.
    #[sea_orm(unique)]
    pub batch_code: String,

    pub farmer_id: i32,
    #[sea_orm(belongs_to, from = "farmer_id", to = "id")]
    pub farmer: HasOne<super::farmer::Entity>,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub packages: HasMany<super::package::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
