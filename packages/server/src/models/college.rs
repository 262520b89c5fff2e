use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

use super::shared::{validate_code, validate_name};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCollegeRequest {
    pub code: String,
    pub name: String,
}

/// Full replace of the editable fields. The code is editable; the surrogate
/// id never is.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateCollegeRequest {
    pub code: String,
    pub name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CollegeResponse {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::college::Model> for CollegeResponse {
    fn from(m: crate::entity::college::Model) -> Self {
        Self {
            id: m.id,
            code: m.code,
            name: m.name,
            created_at: m.created_at,
        }
    }
}

/// Success message for delete operations, naming the deleted entity.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

pub fn validate_create_college(req: &CreateCollegeRequest) -> Result<(), AppError> {
    validate_code(&req.code)?;
    validate_name(&req.name, "Name")
}

pub fn validate_update_college(req: &UpdateCollegeRequest) -> Result<(), AppError> {
    validate_code(&req.code)?;
    validate_name(&req.name, "Name")
}
