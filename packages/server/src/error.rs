use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `NOT_FOUND`, `DUPLICATE_CODE`,
    /// `EMAIL_TAKEN`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Code must be 1-32 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    NotFound(String),
    /// Unique-constraint violation on an editable code.
    DuplicateCode(String),
    EmailTaken,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid email or password".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::DuplicateCode(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "DUPLICATE_CODE",
                    message: msg,
                },
            ),
            AppError::EmailTaken => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "EMAIL_TAKEN",
                    message: "Email is already registered".into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert a failed insert/update into `duplicate` when the database
/// reported a unique-constraint violation, and into `Internal` otherwise.
pub fn map_write_err(e: DbErr, duplicate: impl FnOnce() -> AppError) -> AppError {
    let sql_err = e.sql_err();
    classify_write(sql_err, e, duplicate)
}

fn classify_write(
    sql_err: Option<SqlErr>,
    e: DbErr,
    duplicate: impl FnOnce() -> AppError,
) -> AppError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(_)) => duplicate(),
        _ => AppError::from(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_the_duplicate_error() {
        let err = classify_write(
            Some(SqlErr::UniqueConstraintViolation(
                "duplicate key value violates unique constraint".into(),
            )),
            DbErr::Custom("unused".into()),
            || AppError::DuplicateCode("College code 'CCS' already exists".into()),
        );
        match err {
            AppError::DuplicateCode(msg) => assert!(msg.contains("CCS")),
            other => panic!("expected DuplicateCode, got {other:?}"),
        }
    }

    #[test]
    fn other_write_errors_become_internal() {
        let err = classify_write(None, DbErr::Custom("connection reset".into()), || {
            AppError::DuplicateCode("not reached".into())
        });
        assert!(matches!(err, AppError::Internal(_)));
    }
}
