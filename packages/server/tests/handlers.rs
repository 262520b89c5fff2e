//! Handler-level tests over the real router with a mock database, covering
//! orphaning deletes, the list envelope counts, ID generation and photo
//! uploads. The unique-violation mapping needs a driver-raised error the
//! mock cannot produce, so it is unit-tested next to the error type instead.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Value};
use tower::ServiceExt;

use server::activity_log::ActivityLog;
use server::config::{
    ActivityLogConfig, AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig,
    StorageConfig,
};
use server::state::AppState;
use server::utils::jwt;

const JWT_SECRET: &str = "handler-test-secret";

struct TestApp {
    router: Router,
    token: String,
    tmp: tempfile::TempDir,
}

impl TestApp {
    fn upload_dir(&self) -> PathBuf {
        self.tmp.path().join("uploads")
    }

    fn log_path(&self) -> PathBuf {
        self.tmp.path().join("activity.log")
    }
}

fn test_app(db: DatabaseConnection) -> TestApp {
    let tmp = tempfile::tempdir().unwrap();
    let config = AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors: CorsConfig {
                allow_origins: Vec::new(),
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: "postgres://unused".into(),
        },
        auth: AuthConfig {
            jwt_secret: JWT_SECRET.into(),
            bootstrap_admin_password: None,
        },
        storage: StorageConfig {
            upload_dir: tmp.path().join("uploads"),
            max_upload_size: 5 * 1024 * 1024,
        },
        activity_log: ActivityLogConfig {
            path: tmp.path().join("activity.log"),
        },
    };
    let state = AppState {
        db,
        config: Arc::new(config),
        activity_log: ActivityLog::new(tmp.path().join("activity.log")),
    };
    let router = server::build_router(state);
    let token = jwt::sign(1, "tester@ssis.local", "Tester", JWT_SECRET).unwrap();
    TestApp { router, token, tmp }
}

fn request(app: &TestApp, method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = app.router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

type MockRow = BTreeMap<&'static str, Value>;

fn college_row(id: i32, code: &str, name: &str) -> MockRow {
    BTreeMap::from([
        ("id", Value::from(id)),
        ("code", Value::from(code)),
        ("name", Value::from(name)),
        ("created_at", Value::from(chrono::Utc::now())),
    ])
}

fn student_row(id: &str, profile_pic: Option<&str>) -> MockRow {
    BTreeMap::from([
        ("id", Value::from(id)),
        ("firstname", Value::from("Maria")),
        ("lastname", Value::from("Santos")),
        ("program_id", Value::from(Option::<i32>::None)),
        ("year", Value::from("1st Year")),
        ("gender", Value::from("Female")),
        (
            "profile_pic",
            Value::from(profile_pic.map(|p| p.to_string())),
        ),
        ("created_at", Value::from(chrono::Utc::now())),
    ])
}

fn count_row(n: i64) -> MockRow {
    BTreeMap::from([("num_items", Value::from(n))])
}

#[tokio::test]
async fn create_then_get_college_round_trips() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([
            vec![college_row(1, "CCS", "College of Computing Studies")],
            vec![college_row(1, "CCS", "College of Computing Studies")],
        ])
        .into_connection();
    let app = test_app(db);

    let (status, created) = send(
        &app,
        request(
            &app,
            "POST",
            "/api/v1/colleges",
            Some(serde_json::json!({"code": "CCS", "name": "College of Computing Studies"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["code"], "CCS");

    let (status, fetched) = send(&app, request(&app, "GET", "/api/v1/colleges/1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["code"], created["code"]);
    assert_eq!(fetched["name"], created["name"]);
    assert_eq!(fetched["id"], created["id"]);
}

#[tokio::test]
async fn delete_college_unlinks_dependent_programs() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![college_row(1, "CCS", "College of Computing Studies")]])
        .append_exec_results([
            // The programs update runs first, then the delete itself.
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
        ])
        .into_connection();
    let app = test_app(db);

    let (status, body) = send(&app, request(&app, "DELETE", "/api/v1/colleges/1", None)).await;
    assert_eq!(status, StatusCode::OK);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("2 program(s)"), "unexpected message: {message}");
    assert!(message.contains("unassigned"), "unexpected message: {message}");
}

#[tokio::test]
async fn get_college_missing_returns_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<MockRow>::new()])
        .into_connection();
    let app = test_app(db);

    let (status, body) = send(&app, request(&app, "GET", "/api/v1/colleges/99", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn list_colleges_reports_both_counts_over_a_page() {
    let rows: Vec<MockRow> = (1..=10)
        .map(|i| college_row(i, &format!("C{i:02}"), &format!("College {i}")))
        .collect();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row(25)]])
        .append_query_results([vec![count_row(25)]])
        .append_query_results([rows])
        .into_connection();
    let app = test_app(db);

    let (status, body) = send(
        &app,
        request(&app, "GET", "/api/v1/colleges?start=0&length=10", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recordsTotal"], 25);
    assert_eq!(body["recordsFiltered"], 25);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = test_app(db);

    let req = Request::builder()
        .method("GET")
        .uri("/api/v1/colleges")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_MISSING");
}

#[tokio::test]
async fn create_student_returns_generated_id_and_logs_it() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // No students for the current year yet, then the insert result.
        .append_query_results([Vec::<MockRow>::new()])
        .append_query_results([vec![student_row("2026-0001", None)]])
        .into_connection();
    let app = test_app(db);

    let (status, body) = send(
        &app,
        request(
            &app,
            "POST",
            "/api/v1/students",
            Some(serde_json::json!({
                "firstname": "Maria",
                "lastname": "Santos",
                "program_id": null,
                "year": "1st Year",
                "gender": "Female"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], "2026-0001");
    assert_eq!(body["program_id"], serde_json::Value::Null);

    let log = std::fs::read_to_string(app.log_path()).unwrap();
    assert!(log.contains("CREATE_STUDENT"), "unexpected log: {log}");
    assert!(log.contains("2026-0001"), "unexpected log: {log}");
}

#[tokio::test]
async fn upload_student_photo_stores_file_and_updates_row() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![student_row("2025-0001", None)]])
        .append_query_results([vec![student_row("2025-0001", Some("/uploads/done.png"))]])
        .into_connection();
    let app = test_app(db);

    // A non-file field first, so the handler has to skip past it.
    let boundary = "ssis-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"note\"\r\n\r\n\
         disregard\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"portrait.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         not-really-a-png\r\n\
         --{boundary}--\r\n"
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/students/2025-0001/photo")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile_pic"], "/uploads/done.png");

    let mut entries: Vec<_> = std::fs::read_dir(app.upload_dir())
        .unwrap()
        .map(|e| e.unwrap())
        .collect();
    assert_eq!(entries.len(), 1);
    let entry = entries.pop().unwrap();
    let name = entry.file_name().into_string().unwrap();
    assert!(name.starts_with("2025-0001-"), "unexpected name: {name}");
    assert!(name.ends_with(".png"), "unexpected name: {name}");
    assert_eq!(
        std::fs::read_to_string(entry.path()).unwrap(),
        "not-really-a-png"
    );
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![student_row("2025-0001", None)]])
        .into_connection();
    let app = test_app(db);

    let boundary = "ssis-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"note\"\r\n\r\n\
         no file here\r\n\
         --{boundary}--\r\n"
    );
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/students/2025-0001/photo")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
