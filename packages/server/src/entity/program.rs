use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "program")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub code: String,
    pub name: String,

    /// NULL once the parent college is deleted (orphaned program).
    pub college_id: Option<i32>,
    #[sea_orm(belongs_to, from = "college_id", to = "id")]
    pub college: BelongsTo<Option<super::college::Entity>>,

    #[sea_orm(has_many)]
    pub students: HasMany<super::student::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
