use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "college")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Human-chosen short code (e.g. "CCS"). Unique but editable.
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,

    #[sea_orm(has_many)]
    pub programs: HasMany<super::program::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
