//! Image-store cleanup that survives crashes.
//!
//! Paths that must disappear from the image store are first written to the
//! `asset_deletion` table in the same transaction that drops the rows
//! referencing them. The request then tries to remove them right away; what
//! fails stays queued and the [`AssetSweeper`] retries it later.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::ServiceError;
use crate::image_store::ImageStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsset {
    pub path: String,
    pub attempts: i32,
}

/// Durable queue of image-store paths awaiting removal.
#[async_trait]
pub trait AssetQueue: Send + Sync {
    async fn enqueue(&self, paths: &[String]) -> Result<(), ServiceError>;
    async fn clear(&self, paths: &[String]) -> Result<(), ServiceError>;
    async fn record_failure(&self, paths: &[String], error: &str) -> Result<(), ServiceError>;
    /// Fewest attempts first, then oldest, so rows that keep failing do not
    /// starve newer ones.
    async fn pending(&self, limit: u64) -> Result<Vec<PendingAsset>, ServiceError>;
}

pub struct SeaOrmAssetQueue {
    pub db: DatabaseConnection,
}

impl SeaOrmAssetQueue {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl AssetQueue for SeaOrmAssetQueue {
    async fn enqueue(&self, paths: &[String]) -> Result<(), ServiceError> {
        Ok(models::asset_deletion::enqueue(&self.db, paths).await?)
    }

    async fn clear(&self, paths: &[String]) -> Result<(), ServiceError> {
        models::asset_deletion::clear(&self.db, paths).await?;
        Ok(())
    }

    async fn record_failure(&self, paths: &[String], error: &str) -> Result<(), ServiceError> {
        Ok(models::asset_deletion::record_failure(&self.db, paths, error).await?)
    }

    async fn pending(&self, limit: u64) -> Result<Vec<PendingAsset>, ServiceError> {
        let rows = models::asset_deletion::pending(&self.db, limit).await?;
        Ok(rows.into_iter().map(|r| PendingAsset { path: r.path, attempts: r.attempts }).collect())
    }
}

/// Best-effort, in-request removal of already-queued assets.
#[derive(Clone)]
pub struct AssetCleaner {
    store: Arc<dyn ImageStore>,
    queue: Arc<dyn AssetQueue>,
}

impl AssetCleaner {
    pub fn new(store: Arc<dyn ImageStore>, queue: Arc<dyn AssetQueue>) -> Self { Self { store, queue } }

    pub fn queue(&self) -> &Arc<dyn AssetQueue> { &self.queue }

    /// Remove one file via `delete_file` and the rest via `bulk_delete_files`,
    /// concurrently. Never fails; outcomes are written back to the queue.
    pub async fn remove(&self, single: Option<String>, bulk: Vec<String>) {
        let single_fut = async {
            match &single {
                Some(path) => Some(self.store.delete_file(path).await),
                None => None,
            }
        };
        let bulk_fut = async {
            if bulk.is_empty() { None } else { Some(self.store.bulk_delete_files(&bulk).await) }
        };
        let (single_res, bulk_res) = tokio::join!(single_fut, bulk_fut);

        if let (Some(path), Some(res)) = (single, single_res) {
            self.settle(vec![path], res.map_err(|e| e.to_string())).await;
        }
        if let Some(res) = bulk_res {
            self.settle(bulk, res.map_err(|e| e.to_string())).await;
        }
    }

    /// Queue and try to remove an upload that no row will reference.
    pub async fn discard(&self, path: String) {
        if let Err(e) = self.queue.enqueue(std::slice::from_ref(&path)).await {
            warn!(error = %e, path = %path, "failed to queue orphaned upload");
        }
        self.remove(Some(path), Vec::new()).await;
    }

    async fn settle(&self, paths: Vec<String>, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => {
                debug!(count = paths.len(), "assets removed");
                if let Err(e) = self.queue.clear(&paths).await {
                    warn!(error = %e, "failed to clear asset deletion rows");
                }
            }
            Err(err) => {
                warn!(error = %err, paths = ?paths, "image cleanup failed, left for sweeper");
                if let Err(e) = self.queue.record_failure(&paths, &err).await {
                    warn!(error = %e, "failed to record asset deletion failure");
                }
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
}

/// Periodic retry of queued asset deletions.
pub struct AssetSweeper {
    store: Arc<dyn ImageStore>,
    queue: Arc<dyn AssetQueue>,
}

impl AssetSweeper {
    pub fn new(store: Arc<dyn ImageStore>, queue: Arc<dyn AssetQueue>) -> Self { Self { store, queue } }

    pub async fn sweep_once(&self, batch: u64) -> Result<SweepReport, ServiceError> {
        let pending = self.queue.pending(batch).await?;
        if pending.is_empty() {
            return Ok(SweepReport::default());
        }
        let paths: Vec<String> = pending.into_iter().map(|p| p.path).collect();
        match self.store.bulk_delete_files(&paths).await {
            Ok(()) => {
                self.queue.clear(&paths).await?;
                info!(removed = paths.len(), "asset sweep removed files");
                Ok(SweepReport { removed: paths.len(), failed: 0 })
            }
            Err(e) => {
                // one bad path fails the whole bulk call; settle each path on its own
                warn!(error = %e, count = paths.len(), "bulk asset sweep failed, retrying one by one");
                let mut report = SweepReport::default();
                for path in paths {
                    let one = std::slice::from_ref(&path);
                    match self.store.delete_file(&path).await {
                        Ok(()) => {
                            self.queue.clear(one).await?;
                            report.removed += 1;
                        }
                        Err(err) => {
                            warn!(error = %err, path = %path, "asset still not removable");
                            self.queue.record_failure(one, &err.to_string()).await?;
                            report.failed += 1;
                        }
                    }
                }
                info!(removed = report.removed, failed = report.failed, "asset sweep settled per path");
                Ok(report)
            }
        }
    }

    /// Run [`sweep_once`](Self::sweep_once) every `interval_secs`; `0` disables.
    pub fn spawn(self: Arc<Self>, interval_secs: u64, batch: u64) -> Option<JoinHandle<()>> {
        if interval_secs == 0 {
            info!("asset sweeper disabled");
            return None;
        }
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep_once(batch).await {
                    warn!(error = %e, "asset sweep aborted");
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_store::mock::{ImageCall, MockImageStore};
    use crate::mock::InMemoryStore;

    fn setup() -> (Arc<MockImageStore>, Arc<InMemoryStore>) {
        (Arc::new(MockImageStore::new()), Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn cleaner_clears_rows_on_success() {
        let (images, store) = setup();
        store.enqueue(&["a".into(), "b".into(), "c".into()]).await.unwrap();
        let cleaner = AssetCleaner::new(images.clone(), store.clone());

        cleaner.remove(Some("a".into()), vec!["b".into(), "c".into()]).await;

        assert!(store.pending(10).await.unwrap().is_empty());
        let calls = images.calls();
        assert!(calls.contains(&ImageCall::Delete("a".into())));
        assert!(calls.contains(&ImageCall::BulkDelete(vec!["b".into(), "c".into()])));
    }

    #[tokio::test]
    async fn cleaner_keeps_rows_on_failure() {
        let (images, store) = setup();
        images.fail_deletes(true);
        store.enqueue(&["a".into()]).await.unwrap();

        AssetCleaner::new(images, store.clone()).remove(Some("a".into()), vec![]).await;

        let pending = store.pending(10).await.unwrap();
        assert_eq!(pending, vec![PendingAsset { path: "a".into(), attempts: 1 }]);
    }

    #[tokio::test]
    async fn sweeper_counts_attempts_then_clears() {
        let (images, store) = setup();
        store.enqueue(&["x".into(), "y".into()]).await.unwrap();
        let sweeper = AssetSweeper::new(images.clone(), store.clone());

        images.fail_deletes(true);
        let r = sweeper.sweep_once(10).await.unwrap();
        assert_eq!(r, SweepReport { removed: 0, failed: 2 });
        assert!(store.pending(10).await.unwrap().iter().all(|p| p.attempts == 1));

        images.fail_deletes(false);
        let r = sweeper.sweep_once(10).await.unwrap();
        assert_eq!(r, SweepReport { removed: 2, failed: 0 });
        assert!(store.pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sweeper_respects_batch_and_idle_queue() {
        let (images, store) = setup();
        let sweeper = AssetSweeper::new(images.clone(), store.clone());
        assert_eq!(sweeper.sweep_once(5).await.unwrap(), SweepReport::default());
        assert!(images.calls().is_empty());

        store.enqueue(&["1".into(), "2".into(), "3".into()]).await.unwrap();
        let r = sweeper.sweep_once(2).await.unwrap();
        assert_eq!(r.removed, 2);
        assert_eq!(store.pending(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sweeper_isolates_a_path_the_store_refuses() {
        let (images, store) = setup();
        images.reject_path("poison");
        store.enqueue(&["poison".into(), "good1".into()]).await.unwrap();
        store.enqueue(&["good2".into()]).await.unwrap();
        let sweeper = AssetSweeper::new(images.clone(), store.clone());

        let r = sweeper.sweep_once(2).await.unwrap();
        assert_eq!(r, SweepReport { removed: 1, failed: 1 });
        assert!(images.calls().contains(&ImageCall::Delete("good1".into())));

        // the failing row sorts behind fresh ones
        let next: Vec<String> = store.pending(1).await.unwrap().into_iter().map(|p| p.path).collect();
        assert_eq!(next, vec!["good2".to_string()]);

        for _ in 0..3 {
            sweeper.sweep_once(2).await.unwrap();
        }
        assert_eq!(store.pending(10).await.unwrap(), vec![PendingAsset { path: "poison".into(), attempts: 4 }]);
    }

    #[tokio::test]
    async fn zero_interval_disables_sweeper() {
        let (images, store) = setup();
        let sweeper = Arc::new(AssetSweeper::new(images, store));
        assert!(sweeper.spawn(0, 10).is_none());
    }
}
