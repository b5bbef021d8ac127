use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "farmer")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub first_name: String,
    pub last_name: Option<String>,
    /// "male", "female" or "other".
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub id_number: Option<String>,
    /// Descriptive physical address.
    pub address: String,
    /// GhanaPost-style code, e.g. "GA-123-4567".
    pub gps_address: Option<String>,
    /// Free-form, e.g. "5 acres".
    pub farm_size: String,
    /// e.g. "Maize, Cocoa".
    pub crop_type: String,
    /// Stored path/URL of the profile image; upload storage is external.
    pub image: Option<String>,
    pub registered_at: DateTimeUtc,

    pub user_id: i32,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub batches: HasMany<super::batch::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
