use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody, map_write_err};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::*;
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    operation_id = "signup",
    summary = "Register a new operator account",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_signup_request(&payload)?;

    let email = payload.email.trim().to_lowercase();
    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))?;

    let new_user = user::ActiveModel {
        email: Set(email.clone()),
        password: Set(password_hash),
        full_name: Set(payload.full_name.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        last_login: Set(None),
        ..Default::default()
    };

    let model = new_user
        .insert(&state.db)
        .await
        .map_err(|e| map_write_err(e, || AppError::EmailTaken))?;

    state.activity_log.append("SIGNUP", &model.email).await;

    Ok((StatusCode::CREATED, Json(SignupResponse::from(model))))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in and obtain a bearer token",
    description = "On success returns a JWT to send as \
        `Authorization: Bearer <token>` on subsequent requests. Unknown email \
        and wrong password produce the same error.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Bad credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let email = payload.email.trim().to_lowercase();
    let found = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = hash::verify_password(&payload.password, &found.password)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {e}")))?;
    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let mut active: user::ActiveModel = found.clone().into();
    active.last_login = Set(Some(chrono::Utc::now()));
    let model = active.update(&state.db).await?;

    let token = jwt::sign(
        model.id,
        &model.email,
        &model.full_name,
        &state.config.auth.jwt_secret,
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))?;

    state.activity_log.append("LOGIN", &model.email).await;

    Ok(Json(LoginResponse {
        token,
        user_id: model.id,
        email: model.email,
        full_name: model.full_name,
    }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current authenticated user",
    responses(
        (status = 200, description = "Token claims", body = MeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user))]
pub async fn me(auth_user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: auth_user.user_id,
        email: auth_user.email,
        full_name: auth_user.full_name,
    })
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Log out",
    description = "Tokens are stateless, so this only records the logout in \
        the activity log. Clients discard the token.",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn logout(auth_user: AuthUser, State(state): State<AppState>) -> StatusCode {
    state.activity_log.append("LOGOUT", &auth_user.email).await;
    StatusCode::NO_CONTENT
}
