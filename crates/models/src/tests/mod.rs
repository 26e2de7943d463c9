
/// Transaction handling and the asset deletion outbox
pub mod transaction_tests;

use std::time::Duration;

use migration::MigratorTrait;
use sea_orm::DatabaseConnection;

use crate::db::{connect_with_config, DatabaseConfig};
use crate::user;

/// Connect and migrate, or `None` when the database tests are skipped or no
/// database is reachable.
pub(crate) async fn test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let mut cfg = DatabaseConfig::from_env();
    cfg.min_connections = 1;
    cfg.connect_timeout_secs = 3;
    cfg.acquire_timeout_secs = 3;
    let db = match tokio::time::timeout(Duration::from_secs(5), connect_with_config(&cfg)).await {
        Ok(Ok(db)) => db,
        Ok(Err(e)) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
        Err(_) => {
            eprintln!("skip: db connect timed out");
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}

pub(crate) async fn test_user(db: &DatabaseConnection) -> anyhow::Result<user::Model> {
    let subject = uuid::Uuid::new_v4().to_string();
    let email = format!("chef_{}@example.com", &subject[..8]);
    Ok(user::upsert_identity(db, None, user::Identity {
        provider: "test",
        subject: &subject,
        email: &email,
        name: "Chef",
        image: None,
    }).await?)
}
