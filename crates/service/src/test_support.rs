#![cfg(test)]
use std::time::Duration;

use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig};
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;
use uuid::Uuid;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn config() -> DatabaseConfig {
    let mut cfg = DatabaseConfig::from_file().unwrap_or_else(|_| DatabaseConfig::from_env());
    cfg.min_connections = 1;
    cfg.connect_timeout_secs = 3;
    cfg.acquire_timeout_secs = 5;
    cfg
}

/// A migrated connection, or `None` when `SKIP_DB_TESTS` is set or no
/// database answers.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let migrated = *MIGRATED
        .get_or_init(|| async {
            match tokio::time::timeout(Duration::from_secs(5), connect_with_config(&config())).await {
                Ok(Ok(db)) => migration::Migrator::up(&db, None).await.is_ok(),
                _ => false,
            }
        })
        .await;
    if !migrated {
        eprintln!("skip: database unavailable");
        return None;
    }
    // Fresh connection for the current test's runtime
    connect_with_config(&config()).await.ok()
}

/// Owner row for repository tests.
pub async fn seed_user(db: &DatabaseConnection) -> Uuid {
    let subject = Uuid::new_v4().to_string();
    let email = format!("svc_{}@example.com", &subject[..8]);
    models::user::upsert_identity(db, None, models::user::Identity {
        provider: "test",
        subject: &subject,
        email: &email,
        name: "Service Test",
        image: None,
    })
    .await
    .expect("seed user")
    .id
}
