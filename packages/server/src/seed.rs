use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::user;
use crate::utils::hash;

/// Email of the bootstrap operator account.
pub const BOOTSTRAP_ADMIN_EMAIL: &str = "admin@ssis.local";

/// Ensure the student ID format check constraint exists.
///
/// Schema-sync does not manage check constraints, so it is installed manually
/// on startup. Re-adding an existing constraint errors; that case is logged
/// and ignored.
pub async fn ensure_constraints(db: &DatabaseConnection) -> Result<(), DbErr> {
    let stmt = "ALTER TABLE student ADD CONSTRAINT chk_student_id_format \
                CHECK (id ~ '^[0-9]{4}-[0-9]{4}$')";

    match db.execute_unprepared(stmt).await {
        Ok(_) => {
            info!("Installed check constraint chk_student_id_format");
        }
        Err(e) => {
            tracing::debug!("Check constraint chk_student_id_format not added: {}", e);
        }
    }

    Ok(())
}

/// Create the bootstrap admin account when the users table is empty.
///
/// Runs on startup. Does nothing unless `auth.bootstrap_admin_password` is
/// configured, so a fresh deployment opts into it explicitly.
pub async fn seed_bootstrap_admin(
    db: &DatabaseConnection,
    config: &AuthConfig,
) -> anyhow::Result<()> {
    let Some(password) = config.bootstrap_admin_password.as_deref() else {
        return Ok(());
    };

    let existing = user::Entity::find().count(db).await?;
    if existing > 0 {
        return Ok(());
    }

    let password_hash = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash bootstrap password: {e}"))?;

    let admin = user::ActiveModel {
        email: Set(BOOTSTRAP_ADMIN_EMAIL.to_string()),
        password: Set(password_hash),
        full_name: Set("Administrator".to_string()),
        created_at: Set(chrono::Utc::now()),
        last_login: Set(None),
        ..Default::default()
    };

    let result = user::Entity::insert(admin)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Email)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => {
            info!("Seeded bootstrap admin account {}", BOOTSTRAP_ADMIN_EMAIL);
            Ok(())
        }
        // Another instance won the race; the account exists either way.
        Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
