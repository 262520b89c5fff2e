use axum::http::StatusCode;
use axum::response::IntoResponse;
use server::error::AppError;

fn status_of(err: AppError) -> StatusCode {
    err.into_response().status()
}

#[test]
fn errors_map_to_expected_status_codes() {
    assert_eq!(
        status_of(AppError::Validation("bad input".into())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(status_of(AppError::TokenMissing), StatusCode::UNAUTHORIZED);
    assert_eq!(status_of(AppError::TokenInvalid), StatusCode::UNAUTHORIZED);
    assert_eq!(
        status_of(AppError::InvalidCredentials),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        status_of(AppError::NotFound("College not found".into())),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(AppError::DuplicateCode("College code 'CCS' already exists".into())),
        StatusCode::CONFLICT
    );
    assert_eq!(status_of(AppError::EmailTaken), StatusCode::CONFLICT);
    assert_eq!(
        status_of(AppError::Internal("db exploded".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn db_errors_become_internal() {
    let err = AppError::from(sea_orm::DbErr::Custom("connection reset".into()));
    assert_eq!(
        err.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn duplicate_code_body_names_the_offending_code() {
    let response =
        AppError::DuplicateCode("College code 'CCS' already exists".into()).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("DUPLICATE_CODE"));
    assert!(body.contains("CCS"));
}

#[tokio::test]
async fn internal_detail_is_not_leaked_to_clients() {
    let response = AppError::Internal("password=hunter2".into()).into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(!body.contains("hunter2"));
    assert!(body.contains("INTERNAL_ERROR"));
}
