use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{college, program, student};
use crate::error::AppError;

use super::shared::validate_name;

/// Recognized year levels, in order.
pub const YEAR_LEVELS: &[&str] = &["1st Year", "2nd Year", "3rd Year", "4th Year", "5th Year"];

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateStudentRequest {
    pub firstname: String,
    pub lastname: String,
    /// Enrolled program. May be omitted.
    pub program_id: Option<i32>,
    /// One of "1st Year" .. "5th Year".
    pub year: String,
    pub gender: String,
}

/// Full replace of the editable fields. The `YYYY-NNNN` id is immutable.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateStudentRequest {
    pub firstname: String,
    pub lastname: String,
    pub program_id: Option<i32>,
    pub year: String,
    pub gender: String,
}

/// A student with program and college display fields inlined. Parent fields
/// are null for orphaned rows.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StudentResponse {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub program_id: Option<i32>,
    pub program_code: Option<String>,
    pub program_name: Option<String>,
    pub college_id: Option<i32>,
    pub college_code: Option<String>,
    pub college_name: Option<String>,
    pub year: String,
    pub gender: String,
    pub profile_pic: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl
    From<(
        student::Model,
        Option<program::Model>,
        Option<college::Model>,
    )> for StudentResponse
{
    fn from(
        (s, p, c): (
            student::Model,
            Option<program::Model>,
            Option<college::Model>,
        ),
    ) -> Self {
        Self {
            id: s.id,
            firstname: s.firstname,
            lastname: s.lastname,
            program_id: s.program_id,
            program_code: p.as_ref().map(|p| p.code.clone()),
            program_name: p.map(|p| p.name),
            college_id: c.as_ref().map(|c| c.id),
            college_code: c.as_ref().map(|c| c.code.clone()),
            college_name: c.map(|c| c.name),
            year: s.year,
            gender: s.gender,
            profile_pic: s.profile_pic,
            created_at: s.created_at,
        }
    }
}

fn validate_student_fields(
    firstname: &str,
    lastname: &str,
    year: &str,
    gender: &str,
) -> Result<(), AppError> {
    validate_name(firstname, "First name")?;
    validate_name(lastname, "Last name")?;
    if !YEAR_LEVELS.contains(&year) {
        return Err(AppError::Validation(format!(
            "Year must be one of: {}",
            YEAR_LEVELS.join(", ")
        )));
    }
    let gender = gender.trim();
    if gender.is_empty() || gender.chars().count() > 32 {
        return Err(AppError::Validation(
            "Gender must be 1-32 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_student(req: &CreateStudentRequest) -> Result<(), AppError> {
    validate_student_fields(&req.firstname, &req.lastname, &req.year, &req.gender)
}

pub fn validate_update_student(req: &UpdateStudentRequest) -> Result<(), AppError> {
    validate_student_fields(&req.firstname, &req.lastname, &req.year, &req.gender)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(year: &str, gender: &str) -> CreateStudentRequest {
        CreateStudentRequest {
            firstname: "Jane".into(),
            lastname: "Doe".into(),
            program_id: None,
            year: year.into(),
            gender: gender.into(),
        }
    }

    #[test]
    fn accepts_known_year_levels() {
        for year in YEAR_LEVELS {
            assert!(validate_create_student(&request(year, "Female")).is_ok());
        }
    }

    #[test]
    fn rejects_unknown_year_level() {
        assert!(validate_create_student(&request("6th Year", "Male")).is_err());
        assert!(validate_create_student(&request("", "Male")).is_err());
    }

    #[test]
    fn rejects_blank_gender() {
        assert!(validate_create_student(&request("1st Year", "   ")).is_err());
    }
}
