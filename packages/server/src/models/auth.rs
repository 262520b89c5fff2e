use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    pub id: i32,
    pub email: String,
    pub full_name: String,
}

impl From<user::Model> for SignupResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            full_name: m.full_name,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i32,
    pub email: String,
    pub full_name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub user_id: i32,
    pub email: String,
    pub full_name: String,
}

/// Minimal shape check: `local@domain` with a dotted, non-empty domain.
fn is_plausible_email(email: &str) -> bool {
    if email.len() > 256 {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

pub fn validate_signup_request(req: &SignupRequest) -> Result<(), AppError> {
    if !is_plausible_email(req.email.trim()) {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    if req.password.chars().count() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    let name = req.full_name.trim();
    if name.is_empty() || name.chars().count() > 256 {
        return Err(AppError::Validation(
            "Full name must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_login_request(req: &LoginRequest) -> Result<(), AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".into(),
        ));
    }
    Ok(())
}
