use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{college, program};
use crate::error::AppError;

use super::shared::{validate_code, validate_name};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateProgramRequest {
    pub code: String,
    pub name: String,
    /// Parent college. May be omitted to create an unassigned program.
    pub college_id: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProgramRequest {
    pub code: String,
    pub name: String,
    pub college_id: Option<i32>,
}

/// A program with its parent college's display fields inlined. The college
/// fields are null for orphaned programs.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProgramResponse {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub college_id: Option<i32>,
    pub college_code: Option<String>,
    pub college_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<(program::Model, Option<college::Model>)> for ProgramResponse {
    fn from((p, c): (program::Model, Option<college::Model>)) -> Self {
        Self {
            id: p.id,
            code: p.code,
            name: p.name,
            college_id: p.college_id,
            college_code: c.as_ref().map(|c| c.code.clone()),
            college_name: c.map(|c| c.name),
            created_at: p.created_at,
        }
    }
}

pub fn validate_create_program(req: &CreateProgramRequest) -> Result<(), AppError> {
    validate_code(&req.code)?;
    validate_name(&req.name, "Name")
}

pub fn validate_update_program(req: &UpdateProgramRequest) -> Result<(), AppError> {
    validate_code(&req.code)?;
    validate_name(&req.name, "Name")
}
