use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// When set and the users table is empty, a bootstrap admin account
    /// (`admin@ssis.local`) is created with this password on startup.
    pub bootstrap_admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory where uploaded profile pictures are stored.
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_upload_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ActivityLogConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub activity_log: ActivityLogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.bootstrap_admin_password", None::<String>)?
            .set_default("storage.upload_dir", "./uploads")?
            .set_default("storage.max_upload_size", 5 * 1024 * 1024_i64)?
            .set_default("activity_log.path", "./logs/activity.log")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., SSIS__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("SSIS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
