use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 hash, never a plaintext password.
    pub password: String,
    pub full_name: String,

    pub created_at: DateTimeUtc,
    pub last_login: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
