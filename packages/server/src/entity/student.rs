use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student")]
pub struct Model {
    /// Server-generated `YYYY-NNNN` identifier. Immutable once assigned.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub firstname: String,
    pub lastname: String,

    /// NULL once the parent program is deleted (orphaned student).
    pub program_id: Option<i32>,
    #[sea_orm(belongs_to, from = "program_id", to = "id")]
    pub program: BelongsTo<Option<super::program::Entity>>,

    /// Year level, one of "1st Year" .. "5th Year".
    pub year: String,
    pub gender: String,

    /// URL path of the uploaded profile picture, if any.
    pub profile_pic: Option<String>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
