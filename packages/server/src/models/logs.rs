use serde::Serialize;

/// Activity log entries, newest first.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LogsResponse {
    pub entries: Vec<String>,
    pub count: usize,
}
