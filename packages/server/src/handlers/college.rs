use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{college, program};
use crate::error::{AppError, ErrorBody, map_write_err};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::college::*;
use crate::models::shared::{ListQuery, PageResponse, contains_ci, resolve_order_column};
use crate::state::AppState;

/// Sortable columns, addressed by `order_column` index. First entry is the
/// default sort.
const SORTABLE: &[college::Column] = &[
    college::Column::Code,
    college::Column::Name,
    college::Column::CreatedAt,
];

#[utoipa::path(
    post,
    path = "/",
    tag = "Colleges",
    operation_id = "createCollege",
    summary = "Create a new college",
    request_body = CreateCollegeRequest,
    responses(
        (status = 201, description = "College created", body = CollegeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Code already exists (DUPLICATE_CODE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(code = %payload.code))]
pub async fn create_college(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCollegeRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_college(&payload)?;

    let code = payload.code.trim().to_string();
    let new_college = college::ActiveModel {
        code: Set(code.clone()),
        name: Set(payload.name.trim().to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_college.insert(&state.db).await.map_err(|e| {
        map_write_err(e, || {
            AppError::DuplicateCode(format!("College code '{code}' already exists"))
        })
    })?;

    state
        .activity_log
        .append("CREATE_COLLEGE", &format!("{} - {}", model.code, model.name))
        .await;

    Ok((StatusCode::CREATED, Json(CollegeResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Colleges",
    operation_id = "listColleges",
    summary = "List colleges with pagination, search and column filters",
    description = "Returns a page of colleges. `search` matches code and name \
        case-insensitively; `code`/`name` parameters filter individual columns. \
        `order_column` indexes the sortable columns (code, name, created_at); \
        out-of-range indexes fall back to the default sort.",
    params(
        ("start" = Option<u64>, Query, description = "Row offset"),
        ("length" = Option<u64>, Query, description = "Page size (1-100)"),
        ("search" = Option<String>, Query, description = "Global search text"),
        ("order_column" = Option<usize>, Query, description = "Sort column index"),
        ("order_dir" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "Page of colleges", body = PageResponse<CollegeResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, params))]
pub async fn list_colleges(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PageResponse<CollegeResponse>>, AppError> {
    let query = ListQuery::from_params(params)?;

    let records_total = college::Entity::find().count(&state.db).await?;

    let mut cond = Condition::all();
    if let Some(term) = query.search.as_deref() {
        cond = cond.add(
            Condition::any()
                .add(contains_ci(
                    Expr::col((college::Entity, college::Column::Code)),
                    term,
                ))
                .add(contains_ci(
                    Expr::col((college::Entity, college::Column::Name)),
                    term,
                )),
        );
    }
    if let Some(v) = query.filter_value("code") {
        cond = cond.add(contains_ci(
            Expr::col((college::Entity, college::Column::Code)),
            v,
        ));
    }
    if let Some(v) = query.filter_value("name") {
        cond = cond.add(contains_ci(
            Expr::col((college::Entity, college::Column::Name)),
            v,
        ));
    }

    let filtered = college::Entity::find().filter(cond);
    let records_filtered = filtered.clone().count(&state.db).await?;

    let sort_column = resolve_order_column(SORTABLE, query.order_column);
    let data = filtered
        .order_by(sort_column, query.order.clone())
        .offset(Some(query.start))
        .limit(Some(query.length))
        .all(&state.db)
        .await?
        .into_iter()
        .map(CollegeResponse::from)
        .collect();

    Ok(Json(PageResponse {
        data,
        records_total,
        records_filtered,
        warnings: Vec::new(),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Colleges",
    operation_id = "getCollege",
    summary = "Get a college by ID",
    params(("id" = i32, Path, description = "College ID")),
    responses(
        (status = 200, description = "College details", body = CollegeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "College not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_college(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CollegeResponse>, AppError> {
    let model = find_college(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Colleges",
    operation_id = "updateCollege",
    summary = "Update a college",
    description = "Replaces the editable fields (code, name). Uniqueness of the \
        new code is enforced by the database constraint.",
    params(("id" = i32, Path, description = "College ID")),
    request_body = UpdateCollegeRequest,
    responses(
        (status = 200, description = "College updated", body = CollegeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "College not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Code already exists (DUPLICATE_CODE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(id))]
pub async fn update_college(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateCollegeRequest>,
) -> Result<Json<CollegeResponse>, AppError> {
    validate_update_college(&payload)?;
    let code = payload.code.trim().to_string();

    let txn = state.db.begin().await?;

    let existing = find_college(&txn, id).await?;
    let mut active: college::ActiveModel = existing.into();
    active.code = Set(code.clone());
    active.name = Set(payload.name.trim().to_string());

    let model = active.update(&txn).await.map_err(|e| {
        map_write_err(e, || {
            AppError::DuplicateCode(format!("College code '{code}' already exists"))
        })
    })?;
    txn.commit().await?;

    state
        .activity_log
        .append("UPDATE_COLLEGE", &format!("{} - {}", model.code, model.name))
        .await;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Colleges",
    operation_id = "deleteCollege",
    summary = "Delete a college",
    description = "Deletes the college and unlinks its programs: their \
        `college_id` is set to NULL, no dependent rows are deleted.",
    params(("id" = i32, Path, description = "College ID")),
    responses(
        (status = 200, description = "College deleted", body = DeleteResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "College not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn delete_college(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteResponse>, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_college(&txn, id).await?;

    // Unlink dependents before the delete. Same effect as ON DELETE SET NULL,
    // kept in the transaction so readers never see a dangling reference.
    let unlinked = unlink_programs(id).exec(&txn).await?.rows_affected;

    college::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    state
        .activity_log
        .append(
            "DELETE_COLLEGE",
            &format!("{} - {} ({unlinked} program(s) unassigned)", existing.code, existing.name),
        )
        .await;

    Ok(Json(DeleteResponse {
        message: format!(
            "College '{}' deleted. {unlinked} program(s) are now unassigned.",
            existing.code
        ),
    }))
}

/// Null the `college_id` of every program under this college.
fn unlink_programs(id: i32) -> UpdateMany<program::Entity> {
    program::Entity::update_many()
        .filter(program::Column::CollegeId.eq(id))
        .col_expr(program::Column::CollegeId, Expr::value(Option::<i32>::None))
}

async fn find_college<C: ConnectionTrait>(db: &C, id: i32) -> Result<college::Model, AppError> {
    college::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("College not found".into()))
}
