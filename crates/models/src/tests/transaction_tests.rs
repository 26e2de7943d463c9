use super::{test_db, test_user};
use crate::{asset_deletion, menu, user};
use anyhow::Result;
use sea_orm::{EntityTrait, TransactionTrait};
use uuid::Uuid;

/// Test rollback discards writes made inside the transaction
#[tokio::test]
async fn test_transaction_rollback() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };

    let owner = test_user(&db).await?;
    let txn = db.begin().await?;
    let m = menu::create(&txn, owner.id, "Rolled back", None).await?;
    txn.rollback().await?;

    assert!(menu::Entity::find_by_id(m.id).one(&db).await?.is_none());
    user::hard_delete(&db, owner.id).await?;
    Ok(())
}

/// Queued asset paths are deduplicated, counted on failure and cleared
#[tokio::test]
async fn test_asset_deletion_outbox() -> Result<()> {
    let Some(db) = test_db().await else { return Ok(()) };

    let p1 = format!("tests/{}/a.webp", Uuid::new_v4());
    let p2 = format!("tests/{}/b.webp", Uuid::new_v4());
    let txn = db.begin().await?;
    asset_deletion::enqueue(&txn, &[p1.clone(), p2.clone()]).await?;
    asset_deletion::enqueue(&txn, &[p1.clone()]).await?;
    txn.commit().await?;

    asset_deletion::record_failure(&db, &[p1.clone()], "503 from image store").await?;
    let pending = asset_deletion::pending(&db, 10_000).await?;
    let row = pending.iter().find(|r| r.path == p1).expect("p1 queued");
    assert_eq!(row.attempts, 1);
    assert_eq!(row.last_error.as_deref(), Some("503 from image store"));
    assert_eq!(pending.iter().filter(|r| r.path == p1).count(), 1);

    let cleared = asset_deletion::clear(&db, &[p1, p2]).await?;
    assert_eq!(cleared, 2);
    Ok(())
}
