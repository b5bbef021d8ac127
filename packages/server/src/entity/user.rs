use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role assigned to self-registered accounts.
pub const DEFAULT_ROLE: &str = "user";
/// Role with override rights on every owned resource.
pub const ADMIN_ROLE: &str = "admin";

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub contact: Option<String>,
    pub avatar: Option<String>,
    /// "user" or "admin".
    pub role: String,
    /// Id of the admin who created this account, if admin-created.
    /// Informational back-reference only, never an ownership edge.
    pub created_by: Option<i32>,
    /// Soft-delete flag. Deleted users are restorable and keep their rows.
    pub deleted: bool,

    #[sea_orm(has_many)]
    pub farmers: HasMany<super::farmer::Entity>,

    #[sea_orm(has_many)]
    pub batches: HasMany<super::batch::Entity>,

    #[sea_orm(has_many)]
    pub packages: HasMany<super::package::Entity>,

    #[sea_orm(has_many)]
    pub scans: HasMany<super::scan::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
