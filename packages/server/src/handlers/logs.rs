use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::logs::LogsResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Activity Log",
    operation_id = "listLogEntries",
    summary = "Activity log entries, newest first",
    responses(
        (status = 200, description = "Log entries", body = LogsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_entries(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<LogsResponse>, AppError> {
    let entries = state
        .activity_log
        .entries()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read activity log: {e}")))?;
    let count = entries.len();
    Ok(Json(LogsResponse { entries, count }))
}

#[utoipa::path(
    get,
    path = "/download",
    tag = "Activity Log",
    operation_id = "downloadLog",
    summary = "Download the raw log file",
    responses(
        (status = 200, description = "Log file, oldest entries first", content_type = "text/plain"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn download(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let content = state
        .activity_log
        .raw()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read activity log: {e}")))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"activity.log\"",
            ),
        ],
        content,
    ))
}

#[utoipa::path(
    post,
    path = "/clear",
    tag = "Activity Log",
    operation_id = "clearLog",
    summary = "Clear the activity log",
    responses(
        (status = 204, description = "Log cleared"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn clear(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state
        .activity_log
        .clear()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to clear activity log: {e}")))?;

    // Recorded after the truncate so the trail notes who cleared it.
    state
        .activity_log
        .append("CLEAR_LOG", &auth_user.email)
        .await;

    Ok(StatusCode::NO_CONTENT)
}
