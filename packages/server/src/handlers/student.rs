use std::collections::HashMap;

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Datelike;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{college, program, student};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::college::DeleteResponse;
use crate::models::shared::{ListQuery, PageResponse, contains_ci, resolve_order_column};
use crate::models::student::*;
use crate::state::AppState;
use crate::utils::{student_id, upload};

/// Sortable columns, addressed by `order_column` index. First entry is the
/// default sort.
const SORTABLE: &[student::Column] = &[
    student::Column::Id,
    student::Column::Firstname,
    student::Column::Lastname,
    student::Column::Year,
    student::Column::Gender,
    student::Column::CreatedAt,
];

/// ID allocation retries when concurrent inserts race for the same sequence.
const MAX_ID_ATTEMPTS: usize = 3;

/// Multipart framing overhead allowed on top of the configured file size.
const UPLOAD_OVERHEAD: usize = 64 * 1024;

/// Body limit for the photo upload route. The exact file size check lives in
/// the handler; this just caps the transport.
pub fn upload_body_limit(config: &crate::config::AppConfig) -> axum::extract::DefaultBodyLimit {
    axum::extract::DefaultBodyLimit::max(config.storage.max_upload_size + UPLOAD_OVERHEAD)
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Students",
    operation_id = "createStudent",
    summary = "Create a new student",
    description = "The `YYYY-NNNN` student ID is generated server-side: the \
        admission year is the current year and the sequence is one past the \
        highest sequence already used for that year. Allocation happens inside \
        the insert transaction and is retried on conflict, so concurrent \
        creates never share an ID.",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload))]
pub async fn create_student(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_student(&payload)?;

    let parent = match payload.program_id {
        Some(pid) => Some(find_program_with_college(&state.db, pid).await?),
        None => None,
    };

    let year = chrono::Utc::now().year();
    for _ in 0..MAX_ID_ATTEMPTS {
        let txn = state.db.begin().await?;

        let max_seq = max_sequence_for_year(&txn, year).await?;
        let id = student_id::next_id(year, max_seq);

        let new_student = student::ActiveModel {
            id: Set(id.clone()),
            firstname: Set(payload.firstname.trim().to_string()),
            lastname: Set(payload.lastname.trim().to_string()),
            program_id: Set(payload.program_id),
            year: Set(payload.year.clone()),
            gender: Set(payload.gender.trim().to_string()),
            profile_pic: Set(None),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        match new_student.insert(&txn).await {
            Ok(model) => {
                txn.commit().await?;
                state
                    .activity_log
                    .append(
                        "CREATE_STUDENT",
                        &format!("{} - {} {}", model.id, model.firstname, model.lastname),
                    )
                    .await;
                let (p, c) = match parent {
                    Some((p, c)) => (Some(p), c),
                    None => (None, None),
                };
                return Ok((
                    StatusCode::CREATED,
                    Json(StudentResponse::from((model, p, c))),
                ));
            }
            // Another writer took this sequence between our MAX and the
            // insert. Roll back and recompute.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                txn.rollback().await?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(format!(
        "Could not allocate a student ID for year {year} after {MAX_ID_ATTEMPTS} attempts"
    )))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Students",
    operation_id = "listStudents",
    summary = "List students with pagination, search and column filters",
    description = "Returns a page of students, LEFT-JOINed to their program \
        and its college so orphaned students appear with null parent fields. \
        `search` matches id, names, year, gender and the program/college \
        code/name columns; individual columns are filterable by name; \
        `program_id`/`college_id` filter by parent ids when numeric.",
    params(
        ("start" = Option<u64>, Query, description = "Row offset"),
        ("length" = Option<u64>, Query, description = "Page size (1-100)"),
        ("search" = Option<String>, Query, description = "Global search text"),
        ("order_column" = Option<usize>, Query, description = "Sort column index"),
        ("order_dir" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "Page of students", body = PageResponse<StudentResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, params))]
pub async fn list_students(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PageResponse<StudentResponse>>, AppError> {
    let query = ListQuery::from_params(params)?;
    let mut warnings = Vec::new();

    let records_total = student::Entity::find().count(&state.db).await?;

    let mut cond = Condition::all();
    if let Some(term) = query.search.as_deref() {
        cond = cond.add(search_condition(term));
    }

    for (param, column) in [
        ("id", student::Column::Id),
        ("firstname", student::Column::Firstname),
        ("lastname", student::Column::Lastname),
        ("year", student::Column::Year),
        ("gender", student::Column::Gender),
    ] {
        if let Some(v) = query.filter_value(param) {
            cond = cond.add(contains_ci(Expr::col((student::Entity, column)), v));
        }
    }
    if let Some(v) = query.filter_value("program") {
        cond = cond.add(
            Condition::any()
                .add(contains_ci(
                    Expr::col((program::Entity, program::Column::Code)),
                    v,
                ))
                .add(contains_ci(
                    Expr::col((program::Entity, program::Column::Name)),
                    v,
                )),
        );
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
    if let Some(v) = query.filter_value("program_id") {
        match v.parse::<i32>() {
            Ok(pid) => {
                let exists = program::Entity::find_by_id(pid).count(&state.db).await? > 0;
                if !exists {
                    warnings.push(format!("program_id {pid} does not exist"));
                }
                cond = cond.add(student::Column::ProgramId.eq(pid));
            }
            Err(_) => {
                warnings.push(format!("program_id filter '{v}' is not an integer; ignored"));
            }
        }
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

    let records_filtered = student::Entity::find()
        .join(JoinType::LeftJoin, student::Relation::Program.def())
        .join(JoinType::LeftJoin, program::Relation::College.def())
        .filter(cond.clone())
        .count(&state.db)
        .await?;

    let filtered = student::Entity::find()
        .find_also_related(program::Entity)
        .and_also_related(college::Entity)
        .filter(cond);

    let sort_column = resolve_order_column(SORTABLE, query.order_column);
    let data = filtered
        .order_by(sort_column, query.order.clone())
        .offset(Some(query.start))
        .limit(Some(query.length))
        .all(&state.db)
        .await?
        .into_iter()
        .map(StudentResponse::from)
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
    tag = "Students",
    operation_id = "getStudent",
    summary = "Get a student by ID",
    params(("id" = String, Path, description = "Student ID (YYYY-NNNN)")),
    responses(
        (status = 200, description = "Student details", body = StudentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_student(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StudentResponse>, AppError> {
    let row = student::Entity::find_by_id(id.as_str())
        .find_also_related(program::Entity)
        .and_also_related(college::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))?;
    Ok(Json(row.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Students",
    operation_id = "updateStudent",
    summary = "Update a student",
    description = "Replaces the editable fields. The student ID and profile \
        picture are not editable through this endpoint.",
    params(("id" = String, Path, description = "Student ID (YYYY-NNNN)")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(id))]
pub async fn update_student(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateStudentRequest>,
) -> Result<Json<StudentResponse>, AppError> {
    validate_update_student(&payload)?;

    let txn = state.db.begin().await?;

    let existing = find_student(&txn, &id).await?;
    let parent = match payload.program_id {
        Some(pid) => Some(find_program_with_college(&txn, pid).await?),
        None => None,
    };

    let mut active: student::ActiveModel = existing.into();
    active.firstname = Set(payload.firstname.trim().to_string());
    active.lastname = Set(payload.lastname.trim().to_string());
    active.program_id = Set(payload.program_id);
    active.year = Set(payload.year.clone());
    active.gender = Set(payload.gender.trim().to_string());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    state
        .activity_log
        .append(
            "UPDATE_STUDENT",
            &format!("{} - {} {}", model.id, model.firstname, model.lastname),
        )
        .await;

    let (p, c) = match parent {
        Some((p, c)) => (Some(p), c),
        None => (None, None),
    };
    Ok(Json(StudentResponse::from((model, p, c))))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Students",
    operation_id = "deleteStudent",
    summary = "Delete a student",
    description = "Deletes the student and removes any uploaded profile \
        picture from disk (best-effort).",
    params(("id" = String, Path, description = "Student ID (YYYY-NNNN)")),
    responses(
        (status = 200, description = "Student deleted", body = DeleteResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn delete_student(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let existing = find_student(&state.db, &id).await?;

    student::Entity::delete_by_id(id.as_str()).exec(&state.db).await?;

    if let Some(pic) = &existing.profile_pic {
        remove_upload(&state, pic).await;
    }

    state
        .activity_log
        .append(
            "DELETE_STUDENT",
            &format!("{} - {} {}", existing.id, existing.firstname, existing.lastname),
        )
        .await;

    Ok(Json(DeleteResponse {
        message: format!("Student '{}' deleted.", existing.id),
    }))
}

#[utoipa::path(
    post,
    path = "/{id}/photo",
    tag = "Students",
    operation_id = "uploadStudentPhoto",
    summary = "Upload a student's profile picture",
    description = "Accepts a multipart form with a single image file (png, \
        jpg, jpeg, gif or webp, up to the configured size limit). The file is \
        stored under the upload directory as `{id}-{uuid}.{ext}` and served \
        from `/uploads/`. A previous picture is replaced.",
    params(("id" = String, Path, description = "Student ID (YYYY-NNNN)")),
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture stored", body = StudentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, multipart), fields(id))]
pub async fn upload_student_photo(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<StudentResponse>, AppError> {
    let existing = find_student(&state.db, &id).await?;

    // The expected part is named `file`; any part carrying a filename is
    // accepted for lenient clients. Each field borrows the multipart reader,
    // so the matching one is drained into owned data inside the loop.
    let mut picked: Option<(String, axum::body::Bytes)> = None;
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if part.name() != Some("file") && part.file_name().is_none() {
            continue;
        }
        let filename = part
            .file_name()
            .ok_or_else(|| AppError::Validation("File part has no filename".into()))?
            .to_string();
        let bytes = part
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
        picked = Some((filename, bytes));
        break;
    }
    let (filename, bytes) =
        picked.ok_or_else(|| AppError::Validation("No file in request".into()))?;

    let ext = upload::image_extension(&filename).ok_or_else(|| {
        AppError::Validation("File type not allowed (png, jpg, jpeg, gif, webp)".into())
    })?;
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".into()));
    }
    if bytes.len() > state.config.storage.max_upload_size {
        return Err(AppError::Validation(format!(
            "File exceeds the {} byte limit",
            state.config.storage.max_upload_size
        )));
    }

    let stored_name = format!("{}-{}.{}", existing.id, uuid::Uuid::new_v4(), ext);
    let upload_dir = &state.config.storage.upload_dir;
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {e}")))?;
    tokio::fs::write(upload_dir.join(&stored_name), &bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {e}")))?;

    let old_pic = existing.profile_pic.clone();
    let mut active: student::ActiveModel = existing.into();
    active.profile_pic = Set(Some(format!("/uploads/{stored_name}")));
    let model = active.update(&state.db).await?;

    if let Some(pic) = &old_pic {
        remove_upload(&state, pic).await;
    }

    state
        .activity_log
        .append("UPLOAD_PHOTO", &format!("{} - {}", model.id, stored_name))
        .await;

    respond_with_parents(&state, model).await
}

#[utoipa::path(
    delete,
    path = "/{id}/photo",
    tag = "Students",
    operation_id = "deleteStudentPhoto",
    summary = "Remove a student's profile picture",
    params(("id" = String, Path, description = "Student ID (YYYY-NNNN)")),
    responses(
        (status = 200, description = "Picture removed", body = StudentResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Student not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn delete_student_photo(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StudentResponse>, AppError> {
    let existing = find_student(&state.db, &id).await?;

    let old_pic = existing.profile_pic.clone();
    let mut active: student::ActiveModel = existing.into();
    active.profile_pic = Set(None);
    let model = active.update(&state.db).await?;

    if let Some(pic) = &old_pic {
        remove_upload(&state, pic).await;
    }

    state
        .activity_log
        .append("DELETE_PHOTO", &format!("{}", model.id))
        .await;

    respond_with_parents(&state, model).await
}

/// Highest sequence already allocated for `year`, or None when the year has
/// no students. Sequences are zero-padded to a fixed width, so the
/// lexicographic MAX over the year's prefix is also the numeric maximum.
async fn max_sequence_for_year<C: ConnectionTrait>(
    db: &C,
    year: i32,
) -> Result<Option<i32>, AppError> {
    let prefix = format!("{year:04}-");
    let max_id: Option<Option<String>> = student::Entity::find()
        .filter(student::Column::Id.starts_with(&prefix))
        .select_only()
        .column_as(student::Column::Id.max(), "max_id")
        .into_tuple()
        .one(db)
        .await?;
    Ok(max_id
        .flatten()
        .as_deref()
        .and_then(student_id::sequence_part))
}

/// Global-search condition over the student row and its joined parents, so a
/// college matches whether the caller types its code or its name.
fn search_condition(term: &str) -> Condition {
    let mut any = Condition::any();
    for column in [
        student::Column::Id,
        student::Column::Firstname,
        student::Column::Lastname,
        student::Column::Year,
        student::Column::Gender,
    ] {
        any = any.add(contains_ci(Expr::col((student::Entity, column)), term));
    }
    for column in [program::Column::Code, program::Column::Name] {
        any = any.add(contains_ci(Expr::col((program::Entity, column)), term));
    }
    for column in [college::Column::Code, college::Column::Name] {
        any = any.add(contains_ci(Expr::col((college::Entity, column)), term));
    }
    any
}

async fn find_student<C: ConnectionTrait>(db: &C, id: &str) -> Result<student::Model, AppError> {
    student::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Student not found".into()))
}

async fn find_program_with_college<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<(program::Model, Option<college::Model>), AppError> {
    program::Entity::find_by_id(id)
        .find_also_related(college::Entity)
        .one(db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("program_id {id} does not exist")))
}

async fn respond_with_parents(
    state: &AppState,
    model: student::Model,
) -> Result<Json<StudentResponse>, AppError> {
    let (p, c) = match model.program_id {
        Some(pid) => match program::Entity::find_by_id(pid)
            .find_also_related(college::Entity)
            .one(&state.db)
            .await?
        {
            Some((p, c)) => (Some(p), c),
            None => (None, None),
        },
        None => (None, None),
    };
    Ok(Json(StudentResponse::from((model, p, c))))
}

/// Delete a previously stored upload. Best-effort, only within the upload dir.
async fn remove_upload(state: &AppState, pic_url: &str) {
    let Some(filename) = pic_url.strip_prefix("/uploads/") else {
        return;
    };
    // Reject anything that could escape the upload directory.
    if filename.contains('/') || filename.contains("..") {
        return;
    }
    let path = state.config.storage.upload_dir.join(filename);
    if let Err(e) = tokio::fs::remove_file(&path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!("Failed to remove old upload {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::QueryTrait;

    #[test]
    fn search_reaches_joined_parent_columns() {
        let sql = student::Entity::find()
            .find_also_related(program::Entity)
            .and_also_related(college::Entity)
            .filter(search_condition("engineering"))
            .build(DbBackend::Postgres)
            .to_string();
        // Searching by a college's name must hit the same rows as searching
        // by its code, so both joined columns appear in the predicate.
        assert!(sql.contains(r#""college"."name""#), "unexpected SQL: {sql}");
        assert!(sql.contains(r#""college"."code""#), "unexpected SQL: {sql}");
        assert!(sql.contains(r#""program"."name""#), "unexpected SQL: {sql}");
        assert!(sql.contains(r#""program"."code""#), "unexpected SQL: {sql}");
        assert!(
            sql.contains(r#""student"."lastname""#),
            "unexpected SQL: {sql}"
        );
    }

    #[test]
    fn search_term_is_escaped_and_lowercased() {
        let sql = student::Entity::find()
            .filter(search_condition("O'Brien_50%"))
            .build(DbBackend::Postgres)
            .to_string();
        // Lowercased, LIKE wildcards escaped; the quote escaping is the
        // string-literal rendering (E'..\'..'), not ours.
        assert!(sql.contains(r"o\'brien"), "unexpected SQL: {sql}");
        assert!(sql.contains(r"\\_50"), "unexpected SQL: {sql}");
        assert!(!sql.contains("O'Brien"), "unexpected SQL: {sql}");
    }
}
