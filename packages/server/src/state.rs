use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::activity_log::ActivityLog;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub activity_log: ActivityLog,
}
