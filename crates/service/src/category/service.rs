use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::repository::{CategoryRepository, NewCategory};
use crate::assets::AssetCleaner;
use crate::errors::ServiceError;
use crate::image_store::{category_image_path, ImageStore};
use crate::records::CategoryRecord;
use crate::validation::{DisplayName, ImagePayload, Reorder};

/// Category workflows for one signed-in user at a time; the caller's id is
/// passed to every operation and every lookup is scoped by it.
#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    images: Arc<dyn ImageStore>,
    cleaner: AssetCleaner,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>, images: Arc<dyn ImageStore>, cleaner: AssetCleaner) -> Self {
        Self { repo, images, cleaner }
    }

    /// Append a category to an owned menu, uploading its picture first.
    #[instrument(skip(self, name, image), fields(user_id = %user_id, menu_id = %menu_id))]
    pub async fn create(
        &self,
        user_id: Uuid,
        menu_id: Uuid,
        name: DisplayName,
        image: Option<ImagePayload>,
    ) -> Result<CategoryRecord, ServiceError> {
        if !self.repo.menu_owned(menu_id, user_id).await? {
            return Err(ServiceError::not_found("menu"));
        }

        let image_url = match image {
            Some(img) => {
                let stored = self.images.upload(&img, &category_image_path(user_id, menu_id)).await?;
                if let Err(e) = self.describe(&img, &stored.path).await {
                    self.cleaner.discard(stored.path).await;
                    return Err(e);
                }
                Some(stored.path)
            }
            None => None,
        };

        let new = NewCategory { menu_id, user_id, name: name.as_str().to_string(), image_url: image_url.clone() };
        let created = match self.repo.create(new).await {
            Ok(c) => c,
            Err(e) => {
                if let Some(path) = image_url {
                    self.cleaner.discard(path).await;
                }
                return Err(e);
            }
        };
        info!(category_id = %created.id, position = created.position, "category_created");
        Ok(created)
    }

    /// Remove a category, its items and their images. Image-store cleanup
    /// runs after the commit and never fails the call.
    #[instrument(skip(self), fields(user_id = %user_id, category_id = %id))]
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.repo.find(id, user_id).await?.ok_or_else(|| ServiceError::not_found("category"))?;
        let item_paths = existing.item_image_paths();
        let own_path = existing.image_url.clone();

        let mut queued = item_paths.clone();
        queued.extend(own_path.iter().cloned());
        if !self.repo.delete_cascade(id, user_id, &queued).await? {
            return Err(ServiceError::not_found("category"));
        }
        info!(items = existing.items.len(), "category_deleted");

        self.cleaner.remove(own_path, item_paths).await;
        Ok(())
    }

    /// Rename, and optionally swap the picture. The old picture goes first;
    /// if that fails it is queued for the sweeper and the update continues.
    #[instrument(skip(self, name, image), fields(user_id = %user_id, category_id = %id))]
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        name: DisplayName,
        image: Option<ImagePayload>,
    ) -> Result<CategoryRecord, ServiceError> {
        let existing = self.repo.find(id, user_id).await?.ok_or_else(|| ServiceError::not_found("category"))?;

        let mut image_url = None;
        if let Some(img) = image {
            if let Some(old) = existing.image_url.as_deref() {
                if let Err(e) = self.images.delete_file(old).await {
                    warn!(error = %e, path = %old, "old category image not removed, queued");
                    if let Err(qe) = self.cleaner.queue().enqueue(&[old.to_string()]).await {
                        warn!(error = %qe, "failed to queue old category image");
                    }
                }
            }
            let stored = self.images.upload(&img, &category_image_path(user_id, existing.menu_id)).await?;
            image_url = Some(stored.path);
        }

        let updated = self.repo.update(id, user_id, name.as_str(), image_url.clone()).await;
        if !matches!(updated, Ok(Some(_))) {
            if let Some(path) = image_url {
                self.cleaner.discard(path).await;
            }
        }
        updated?.ok_or_else(|| ServiceError::not_found("category"))
    }

    /// Hash and colour are only logged for category pictures.
    async fn describe(&self, img: &ImagePayload, path: &str) -> Result<(), ServiceError> {
        let hash = self.images.perceptual_hash(img).await?;
        let color = self.images.dominant_color(img).await?;
        debug!(path = %path, blur_hash = %hash, dominant_color = %color, "category image uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %user_id, menu_id = %menu_id))]
    pub async fn get_all(&self, user_id: Uuid, menu_id: Uuid) -> Result<Vec<CategoryRecord>, ServiceError> {
        if !self.repo.menu_owned(menu_id, user_id).await? {
            return Err(ServiceError::not_found("menu"));
        }
        self.repo.list_by_menu(menu_id, user_id).await
    }

    #[instrument(skip(self, reorder), fields(user_id = %user_id, count = reorder.updates().len()))]
    pub async fn update_position(&self, user_id: Uuid, reorder: Reorder) -> Result<(), ServiceError> {
        self.repo.reorder(user_id, reorder.updates()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_store::mock::{ImageCall, MockImageStore};
    use crate::mock::InMemoryStore;
    use crate::validation::PositionUpdate;

    const PNG: &str = "data:image/png;base64,aGVsbG8=";

    struct Fixture {
        store: Arc<InMemoryStore>,
        images: Arc<MockImageStore>,
        svc: CategoryService,
        user: Uuid,
        menu: Uuid,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let images = Arc::new(MockImageStore::new());
        let cleaner = AssetCleaner::new(images.clone(), store.clone());
        let svc = CategoryService::new(store.clone(), images.clone(), cleaner);
        let user = Uuid::new_v4();
        let menu = store.seed_menu(user, "Dinner");
        Fixture { store, images, svc, user, menu }
    }

    fn name(s: &str) -> DisplayName { DisplayName::parse(s).unwrap() }

    fn img() -> Option<ImagePayload> { Some(ImagePayload::parse(PNG).unwrap()) }

    #[tokio::test]
    async fn sequential_creates_get_increasing_positions() {
        let f = fixture();
        for expected in 0..3 {
            let c = f.svc.create(f.user, f.menu, name(&format!("C{expected}")), None).await.unwrap();
            assert_eq!(c.position, expected);
            assert!(c.items.is_empty());
        }
    }

    #[tokio::test]
    async fn create_without_image_skips_image_store() {
        let f = fixture();
        let c = f.svc.create(f.user, f.menu, name("Drinks"), None).await.unwrap();
        assert!(c.image_url.is_none());
        assert!(f.images.calls().is_empty());
    }

    #[tokio::test]
    async fn create_with_image_uploads_under_user_scope() {
        let f = fixture();
        let c = f.svc.create(f.user, f.menu, name("Pizza"), img()).await.unwrap();
        let url = c.image_url.unwrap();
        assert!(url.starts_with(&format!("{}/menus/{}/categories/", f.user, f.menu)));
        let calls = f.images.calls();
        assert!(matches!(calls[0], ImageCall::Upload(_)));
        assert!(calls.contains(&ImageCall::Hash));
        assert!(calls.contains(&ImageCall::Color));
    }

    #[tokio::test]
    async fn failed_upload_aborts_create() {
        let f = fixture();
        f.images.fail_uploads(true);
        let err = f.svc.create(f.user, f.menu, name("Pizza"), img()).await.unwrap_err();
        assert!(matches!(err, ServiceError::ImageStore(_)));
        assert!(f.svc.get_all(f.user, f.menu).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_users_ids_are_not_found() {
        let f = fixture();
        let c = f.svc.create(f.user, f.menu, name("Mine"), None).await.unwrap();
        let intruder = Uuid::new_v4();

        let e = f.svc.create(intruder, f.menu, name("X"), None).await.unwrap_err();
        assert!(matches!(e, ServiceError::NotFound(_)));
        let e = f.svc.update(intruder, c.id, name("X"), None).await.unwrap_err();
        assert!(matches!(e, ServiceError::NotFound(_)));
        let e = f.svc.delete(intruder, c.id).await.unwrap_err();
        assert!(matches!(e, ServiceError::NotFound(_)));
        let e = f.svc.get_all(intruder, f.menu).await.unwrap_err();
        assert!(matches!(e, ServiceError::NotFound(_)));
        let reorder = Reorder::new(vec![PositionUpdate { id: c.id, new_position: 4 }]).unwrap();
        let e = f.svc.update_position(intruder, reorder).await.unwrap_err();
        assert!(matches!(e, ServiceError::NotFound(_)));

        assert_eq!(f.svc.get_all(f.user, f.menu).await.unwrap()[0].position, 0);
    }

    #[tokio::test]
    async fn delete_removes_category_and_items() {
        let f = fixture();
        let keep = f.svc.create(f.user, f.menu, name("Keep"), None).await.unwrap();
        let gone = f.svc.create(f.user, f.menu, name("Gone"), img()).await.unwrap();
        f.store.seed_item(f.user, gone.id, "Soup", Some("u/items/soup.webp"));
        f.store.seed_item(f.user, gone.id, "Bread", None);

        f.svc.delete(f.user, gone.id).await.unwrap();

        let left = f.svc.get_all(f.user, f.menu).await.unwrap();
        assert_eq!(left.iter().map(|c| c.id).collect::<Vec<_>>(), vec![keep.id]);
        assert_eq!(f.store.item_count(), 0);
        let calls = f.images.calls();
        assert!(calls.contains(&ImageCall::Delete(gone.image_url.clone().unwrap())));
        assert!(calls.contains(&ImageCall::BulkDelete(vec!["u/items/soup.webp".into()])));
        assert!(f.store.pending_paths().is_empty());
    }

    #[tokio::test]
    async fn delete_succeeds_when_image_store_fails() {
        let f = fixture();
        let c = f.svc.create(f.user, f.menu, name("Pics"), img()).await.unwrap();
        f.store.seed_item(f.user, c.id, "Cake", Some("u/items/cake.webp"));
        f.images.fail_deletes(true);

        f.svc.delete(f.user, c.id).await.unwrap();

        assert!(f.svc.get_all(f.user, f.menu).await.unwrap().is_empty());
        let mut pending = f.store.pending_paths();
        pending.sort();
        let mut expected = vec!["u/items/cake.webp".to_string(), c.image_url.unwrap()];
        expected.sort();
        assert_eq!(pending, expected);
    }

    #[tokio::test]
    async fn update_position_reorders() {
        let f = fixture();
        let a = f.svc.create(f.user, f.menu, name("A"), None).await.unwrap();
        let b = f.svc.create(f.user, f.menu, name("B"), None).await.unwrap();
        let reorder = Reorder::new(vec![
            PositionUpdate { id: a.id, new_position: 2 },
            PositionUpdate { id: b.id, new_position: 1 },
        ])
        .unwrap();

        f.svc.update_position(f.user, reorder).await.unwrap();

        let ids: Vec<_> = f.svc.get_all(f.user, f.menu).await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn update_position_is_all_or_nothing() {
        let f = fixture();
        let a = f.svc.create(f.user, f.menu, name("A"), None).await.unwrap();
        let reorder = Reorder::new(vec![
            PositionUpdate { id: a.id, new_position: 5 },
            PositionUpdate { id: Uuid::new_v4(), new_position: 1 },
        ])
        .unwrap();

        assert!(matches!(f.svc.update_position(f.user, reorder).await, Err(ServiceError::NotFound(_))));
        assert_eq!(f.svc.get_all(f.user, f.menu).await.unwrap()[0].position, 0);
    }

    #[tokio::test]
    async fn update_replaces_image_old_first() {
        let f = fixture();
        let c = f.svc.create(f.user, f.menu, name("Old"), img()).await.unwrap();
        let old = c.image_url.clone().unwrap();

        let updated = f.svc.update(f.user, c.id, name(" New "), img()).await.unwrap();

        assert_eq!(updated.name, "New");
        assert_ne!(updated.image_url.as_deref(), Some(old.as_str()));
        let calls = f.images.calls();
        let del = calls.iter().position(|c| *c == ImageCall::Delete(old.clone())).unwrap();
        let last_upload = calls.iter().rposition(|c| matches!(c, ImageCall::Upload(_))).unwrap();
        assert!(del < last_upload);
    }

    #[tokio::test]
    async fn update_continues_when_old_image_delete_fails() {
        let f = fixture();
        let c = f.svc.create(f.user, f.menu, name("Old"), img()).await.unwrap();
        let old = c.image_url.clone().unwrap();
        f.images.fail_deletes(true);

        let updated = f.svc.update(f.user, c.id, name("Fresh"), img()).await.unwrap();

        assert!(updated.image_url.is_some());
        assert_ne!(updated.image_url, Some(old.clone()));
        assert_eq!(f.store.pending_paths(), vec![old]);
    }

    #[tokio::test]
    async fn update_without_image_keeps_url() {
        let f = fixture();
        let c = f.svc.create(f.user, f.menu, name("Old"), img()).await.unwrap();
        let before = f.images.calls().len();
        let updated = f.svc.update(f.user, c.id, name("Renamed"), None).await.unwrap();
        assert_eq!(updated.image_url, c.image_url);
        assert_eq!(f.images.calls().len(), before);
    }

    #[tokio::test]
    async fn failed_image_analysis_removes_the_upload() {
        let f = fixture();
        f.images.fail_analysis(true);

        let err = f.svc.create(f.user, f.menu, name("Soups"), img()).await.unwrap_err();

        assert!(matches!(err, ServiceError::ImageStore(_)));
        assert!(f.images.files().is_empty());
        assert!(f.store.pending_paths().is_empty());
        assert!(f.svc.get_all(f.user, f.menu).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orphaned_upload_stays_queued_when_store_refuses_delete() {
        let f = fixture();
        f.images.fail_analysis(true);
        f.images.fail_deletes(true);

        assert!(f.svc.create(f.user, f.menu, name("Soups"), img()).await.is_err());

        let queued = f.store.pending_paths();
        assert_eq!(queued.len(), 1);
        assert_eq!(f.images.files(), queued);
    }
}
