use server::activity_log::ActivityLog;
use tempfile::tempdir;

#[tokio::test]
async fn append_then_read_newest_first() {
    let dir = tempdir().unwrap();
    let log = ActivityLog::new(dir.path().join("activity.log"));

    log.append("CREATE_COLLEGE", "CCS - College of Computer Studies")
        .await;
    log.append("DELETE_COLLEGE", "CCS - College of Computer Studies (2 program(s) unassigned)")
        .await;

    let entries = log.entries().await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].contains("DELETE_COLLEGE:"));
    assert!(entries[1].contains("CREATE_COLLEGE:"));
}

#[tokio::test]
async fn entry_format_is_bracketed_timestamp_action_details() {
    let dir = tempdir().unwrap();
    let log = ActivityLog::new(dir.path().join("activity.log"));

    log.append("LOGIN", "admin@ssis.local").await;

    let entries = log.entries().await.unwrap();
    let line = &entries[0];
    // [YYYY-MM-DD HH:MM:SS] ACTION: details
    assert_eq!(&line[0..1], "[");
    assert_eq!(&line[20..22], "] ");
    assert!(line.ends_with("LOGIN: admin@ssis.local"));
}

#[tokio::test]
async fn entry_is_on_disk_when_append_returns() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("activity.log");
    let log = ActivityLog::new(path.clone());

    log.append("CREATE_STUDENT", "2026-0001 - Maria Santos").await;

    // Read the file directly rather than through the log's own reader, so an
    // unflushed write cannot hide behind shared buffering.
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("CREATE_STUDENT: 2026-0001 - Maria Santos"));
}

#[tokio::test]
async fn missing_file_reads_as_empty() {
    let dir = tempdir().unwrap();
    let log = ActivityLog::new(dir.path().join("never-written.log"));

    assert!(log.entries().await.unwrap().is_empty());
    assert_eq!(log.raw().await.unwrap(), "");
}

#[tokio::test]
async fn append_creates_missing_parent_directories() {
    let dir = tempdir().unwrap();
    let log = ActivityLog::new(dir.path().join("nested/dirs/activity.log"));

    log.append("SIGNUP", "user@ssis.edu").await;

    assert_eq!(log.entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn raw_keeps_oldest_first_order() {
    let dir = tempdir().unwrap();
    let log = ActivityLog::new(dir.path().join("activity.log"));

    log.append("FIRST", "a").await;
    log.append("SECOND", "b").await;

    let raw = log.raw().await.unwrap();
    let first = raw.find("FIRST").unwrap();
    let second = raw.find("SECOND").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn clear_truncates_and_is_idempotent() {
    let dir = tempdir().unwrap();
    let log = ActivityLog::new(dir.path().join("activity.log"));

    log.append("CREATE_STUDENT", "2025-0001 - Jane Doe").await;
    log.clear().await.unwrap();
    assert!(log.entries().await.unwrap().is_empty());

    // Clearing an already-missing file is not an error.
    log.clear().await.unwrap();

    // The log is still usable after a clear.
    log.append("CREATE_STUDENT", "2025-0001 - Jane Doe").await;
    assert_eq!(log.entries().await.unwrap().len(), 1);
}
