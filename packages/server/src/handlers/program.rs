use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{college, program, student};
use crate::error::{AppError, ErrorBody, map_write_err};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::college::DeleteResponse;
use crate::models::program::*;
use crate::models::shared::{ListQuery, PageResponse, contains_ci, resolve_order_column};
use crate::state::AppState;

/// Sortable columns, addressed by `order_column` index. First entry is the
/// default sort.
const SORTABLE: &[program::Column] = &[
    program::Column::Code,
    program::Column::Name,
    program::Column::CreatedAt,
];

#[utoipa::path(
    post,
    path = "/",
    tag = "Programs",
    operation_id = "createProgram",
    summary = "Create a new program",
    request_body = CreateProgramRequest,
    responses(
        (status = 201, description = "Program created", body = ProgramResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Code already exists (DUPLICATE_CODE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(code = %payload.code))]
pub async fn create_program(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateProgramRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_program(&payload)?;
    let code = payload.code.trim().to_string();

    let txn = state.db.begin().await?;

    let parent = match payload.college_id {
        Some(cid) => Some(find_college(&txn, cid).await?),
        None => None,
    };

    let new_program = program::ActiveModel {
        code: Set(code.clone()),
        name: Set(payload.name.trim().to_string()),
        college_id: Set(payload.college_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let model = new_program.insert(&txn).await.map_err(|e| {
        map_write_err(e, || {
            AppError::DuplicateCode(format!("Program code '{code}' already exists"))
        })
    })?;
    txn.commit().await?;

    state
        .activity_log
        .append("CREATE_PROGRAM", &format!("{} - {}", model.code, model.name))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ProgramResponse::from((model, parent))),
    ))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Programs",
    operation_id = "listPrograms",
    summary = "List programs with pagination, search and column filters",
    description = "Returns a page of programs, LEFT-JOINed to their parent \
        college so orphaned programs appear with null college fields. `search` \
        matches program and college code/name; `code`/`name`/`college` filter \
        individual columns; `college_id` filters by parent id when numeric.",
    params(
        ("start" = Option<u64>, Query, description = "Row offset"),
        ("length" = Option<u64>, Query, description = "Page size (1-100)"),
        ("search" = Option<String>, Query, description = "Global search text"),
        ("order_column" = Option<usize>, Query, description = "Sort column index"),
        ("order_dir" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "Page of programs", body = PageResponse<ProgramResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, params))]
pub async fn list_programs(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PageResponse<ProgramResponse>>, AppError> {
    let query = ListQuery::from_params(params)?;
    let mut warnings = Vec::new();

    let records_total = program::Entity::find().count(&state.db).await?;

    let mut cond = Condition::all();
    if let Some(term) = query.search.as_deref() {
        cond = cond.add(
            Condition::any()
                .add(contains_ci(
                    Expr::col((program::Entity, program::Column::Code)),
                    term,
                ))
                .add(contains_ci(
                    Expr::col((program::Entity, program::Column::Name)),
                    term,
                ))
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
            Expr::col((program::Entity, program::Column::Code)),
            v,
        ));
    }
    if let Some(v) = query.filter_value("name") {
        cond = cond.add(contains_ci(
            Expr::col((program::Entity, program::Column::Name)),
            v,
        ));
    }
    if let Some(v) = query.filter_value("college") {
        cond = cond.add(
            Condition::any()
                .add(contains_ci(
                    Expr::col((college::Entity, college::Column::Code)),
                    v,
                ))
                .add(contains_ci(
                    Expr::col((college::Entity, college::Column::Name)),
                    v,
                )),
        );
    }
    if let Some(v) = query.filter_value("college_id") {
        match v.parse::<i32>() {
            Ok(cid) => {
                let exists = college::Entity::find_by_id(cid).count(&state.db).await? > 0;
                if !exists {
                    warnings.push(format!("college_id {cid} does not exist"));
                }
                cond = cond.add(program::Column::CollegeId.eq(cid));
            }
            Err(_) => {
                warnings.push(format!("college_id filter '{v}' is not an integer; ignored"));
            }
        }
    }

    let filtered = program::Entity::find()
        .find_also_related(college::Entity)
        .filter(cond);
    let records_filtered = filtered.clone().count(&state.db).await?;

    let sort_column = resolve_order_column(SORTABLE, query.order_column);
    let data = filtered
        .order_by(sort_column, query.order.clone())
        .offset(Some(query.start))
        .limit(Some(query.length))
        .all(&state.db)
        .await?
        .into_iter()
        .map(ProgramResponse::from)
        .collect();

    Ok(Json(PageResponse {
        data,
        records_total,
        records_filtered,
        warnings,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Programs",
    operation_id = "getProgram",
    summary = "Get a program by ID",
    params(("id" = i32, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Program details", body = ProgramResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_program(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProgramResponse>, AppError> {
    let row = program::Entity::find_by_id(id)
        .find_also_related(college::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".into()))?;
    Ok(Json(row.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Programs",
    operation_id = "updateProgram",
    summary = "Update a program",
    description = "Replaces the editable fields (code, name, college_id). \
        Uniqueness of the new code is enforced by the database constraint.",
    params(("id" = i32, Path, description = "Program ID")),
    request_body = UpdateProgramRequest,
    responses(
        (status = 200, description = "Program updated", body = ProgramResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Code already exists (DUPLICATE_CODE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(id))]
pub async fn update_program(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProgramRequest>,
) -> Result<Json<ProgramResponse>, AppError> {
    validate_update_program(&payload)?;
    let code = payload.code.trim().to_string();

    let txn = state.db.begin().await?;

    let existing = find_program(&txn, id).await?;
    let parent = match payload.college_id {
        Some(cid) => Some(find_college(&txn, cid).await?),
        None => None,
    };

    let mut active: program::ActiveModel = existing.into();
    active.code = Set(code.clone());
    active.name = Set(payload.name.trim().to_string());
    active.college_id = Set(payload.college_id);

    let model = active.update(&txn).await.map_err(|e| {
        map_write_err(e, || {
            AppError::DuplicateCode(format!("Program code '{code}' already exists"))
        })
    })?;
    txn.commit().await?;

    state
        .activity_log
        .append("UPDATE_PROGRAM", &format!("{} - {}", model.code, model.name))
        .await;

    Ok(Json(ProgramResponse::from((model, parent))))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Programs",
    operation_id = "deleteProgram",
    summary = "Delete a program",
    description = "Deletes the program and unlinks its students: their \
        `program_id` is set to NULL, no dependent rows are deleted.",
    params(("id" = i32, Path, description = "Program ID")),
    responses(
        (status = 200, description = "Program deleted", body = DeleteResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Program not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn delete_program(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteResponse>, AppError> {
    let txn = state.db.begin().await?;

    let existing = find_program(&txn, id).await?;

    let unlinked = unlink_students(id).exec(&txn).await?.rows_affected;

    program::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    state
        .activity_log
        .append(
            "DELETE_PROGRAM",
            &format!("{} - {} ({unlinked} student(s) unassigned)", existing.code, existing.name),
        )
        .await;

    Ok(Json(DeleteResponse {
        message: format!(
            "Program '{}' deleted. {unlinked} student(s) are now unassigned.",
            existing.code
        ),
    }))
}

/// Null the `program_id` of every student under this program.
fn unlink_students(id: i32) -> UpdateMany<student::Entity> {
    student::Entity::update_many()
        .filter(student::Column::ProgramId.eq(id))
        .col_expr(student::Column::ProgramId, Expr::value(Option::<i32>::None))
}

async fn find_program<C: ConnectionTrait>(db: &C, id: i32) -> Result<program::Model, AppError> {
    program::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Program not found".into()))
}

async fn find_college<C: ConnectionTrait>(db: &C, id: i32) -> Result<college::Model, AppError> {
    college::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("college_id {id} does not exist")))
}
