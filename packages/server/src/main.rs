use std::sync::Arc;

use tracing::{Level, info};

use server::activity_log::ActivityLog;
use server::config::AppConfig;
use server::state::AppState;
use server::{database, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = Arc::new(AppConfig::load()?);

    let db = database::init_db(&config.database.url).await?;
    seed::ensure_constraints(&db).await?;
    seed::seed_bootstrap_admin(&db, &config.auth).await?;

    let activity_log = ActivityLog::new(config.activity_log.path.clone());
    let state = AppState {
        db,
        config: config.clone(),
        activity_log,
    };

    let app = server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
