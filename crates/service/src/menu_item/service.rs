use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::repository::{ItemChanges, MenuItemRepository, NewImage, NewMenuItem};
use crate::assets::AssetCleaner;
use crate::errors::ServiceError;
use crate::image_store::{item_image_path, ImageStore};
use crate::records::MenuItemRecord;
use crate::validation::{DisplayName, ImagePayload, Reorder};

/// Validated fields shared by item create and update.
#[derive(Debug, Clone)]
pub struct NewItemInput {
    pub name: DisplayName,
    pub description: Option<String>,
    pub price: i64,
    pub image: Option<ImagePayload>,
}

#[derive(Clone)]
pub struct MenuItemService {
    repo: Arc<dyn MenuItemRepository>,
    images: Arc<dyn ImageStore>,
    cleaner: AssetCleaner,
}

impl MenuItemService {
    pub fn new(repo: Arc<dyn MenuItemRepository>, images: Arc<dyn ImageStore>, cleaner: AssetCleaner) -> Self {
        Self { repo, images, cleaner }
    }

    /// Upload and analyse a picture; unlike categories the hash and colour
    /// are kept on the image row.
    async fn store_image(&self, user_id: Uuid, menu_id: Uuid, img: &ImagePayload) -> Result<NewImage, ServiceError> {
        let stored = self.images.upload(img, &item_image_path(user_id, menu_id)).await?;
        let traits = async {
            let blur_hash = self.images.perceptual_hash(img).await?;
            let dominant_color = self.images.dominant_color(img).await?;
            Ok::<_, ServiceError>((blur_hash, dominant_color))
        };
        match traits.await {
            Ok((blur_hash, dominant_color)) => {
                Ok(NewImage { path: stored.path, blur_hash: Some(blur_hash), dominant_color: Some(dominant_color) })
            }
            Err(e) => {
                self.cleaner.discard(stored.path).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(self, input), fields(user_id = %user_id, category_id = %category_id))]
    pub async fn create(&self, user_id: Uuid, category_id: Uuid, input: NewItemInput) -> Result<MenuItemRecord, ServiceError> {
        let menu_id = self
            .repo
            .category_menu(category_id, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("category"))?;

        let image = match &input.image {
            Some(img) => Some(self.store_image(user_id, menu_id, img).await?),
            None => None,
        };
        let uploaded = image.as_ref().map(|i| i.path.clone());
        let created = self
            .repo
            .create(NewMenuItem {
                category_id,
                user_id,
                name: input.name.as_str().to_string(),
                description: input.description,
                price: input.price,
                image,
            })
            .await;
        let created = match created {
            Ok(c) => c,
            Err(e) => {
                if let Some(path) = uploaded {
                    self.cleaner.discard(path).await;
                }
                return Err(e);
            }
        };
        info!(item_id = %created.id, position = created.position, "menu_item_created");
        Ok(created)
    }

    /// Replace the item's fields. A new picture is uploaded before the swap;
    /// the old one is queued in the same transaction and removed afterwards.
    #[instrument(skip(self, input), fields(user_id = %user_id, item_id = %id))]
    pub async fn update(&self, user_id: Uuid, id: Uuid, input: NewItemInput) -> Result<MenuItemRecord, ServiceError> {
        let existing = self.repo.find(id, user_id).await?.ok_or_else(|| ServiceError::not_found("menu item"))?;

        let mut image = None;
        let mut stale = Vec::new();
        if let Some(img) = &input.image {
            let menu_id = self
                .repo
                .category_menu(existing.category_id, user_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("category"))?;
            image = Some(self.store_image(user_id, menu_id, img).await?);
            stale.extend(existing.image.as_ref().map(|i| i.path.clone()));
        }

        let uploaded = image.as_ref().map(|i: &NewImage| i.path.clone());
        let changes = ItemChanges {
            name: input.name.as_str().to_string(),
            description: input.description,
            price: input.price,
            image,
        };
        let updated = self.repo.update(id, user_id, changes, &stale).await;
        if !matches!(updated, Ok(Some(_))) {
            if let Some(path) = uploaded {
                self.cleaner.discard(path).await;
            }
        }
        let updated = updated?.ok_or_else(|| ServiceError::not_found("menu item"))?;

        if let Some(old) = stale.pop() {
            self.cleaner.remove(Some(old), Vec::new()).await;
        }
        Ok(updated)
    }

    #[instrument(skip(self), fields(user_id = %user_id, item_id = %id))]
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.repo.find(id, user_id).await?.ok_or_else(|| ServiceError::not_found("menu item"))?;
        let asset = existing.image.map(|i| i.path);
        let queued: Vec<String> = asset.iter().cloned().collect();
        if !self.repo.delete(id, user_id, &queued).await? {
            return Err(ServiceError::not_found("menu item"));
        }
        info!("menu_item_deleted");
        self.cleaner.remove(asset, Vec::new()).await;
        Ok(())
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

    struct Fixture {
        store: Arc<InMemoryStore>,
        images: Arc<MockImageStore>,
        svc: MenuItemService,
        user: Uuid,
        menu: Uuid,
        category: Uuid,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let images = Arc::new(MockImageStore::new());
        let svc = MenuItemService::new(store.clone(), images.clone(), AssetCleaner::new(images.clone(), store.clone()));
        let user = Uuid::new_v4();
        let menu = store.seed_menu(user, "Dinner");
        let category = store.seed_category(user, menu, "Mains", None);
        Fixture { store, images, svc, user, menu, category }
    }

    fn input(name: &str, price: i64, image: Option<&str>) -> NewItemInput {
        NewItemInput {
            name: DisplayName::parse(name).unwrap(),
            description: None,
            price,
            image: image.map(|i| ImagePayload::parse(i).unwrap()),
        }
    }

    #[tokio::test]
    async fn create_appends_and_keeps_image_metadata() {
        let f = fixture();
        let a = f.svc.create(f.user, f.category, input("Soup", 650, None)).await.unwrap();
        let b = f.svc.create(f.user, f.category, input("Stew", 900, Some("aGk="))).await.unwrap();
        assert_eq!((a.position, b.position), (0, 1));
        assert!(a.image.is_none());

        let img = b.image.unwrap();
        assert!(img.path.starts_with(&format!("{}/menus/{}/items/", f.user, f.menu)));
        assert_eq!(img.blur_hash.as_deref(), Some("L00000fQfQfQ"));
        assert_eq!(img.dominant_color.as_deref(), Some("#808080"));
        assert_eq!(b.image_id, Some(img.id));
    }

    #[tokio::test]
    async fn foreign_category_is_not_found() {
        let f = fixture();
        let err = f.svc.create(Uuid::new_v4(), f.category, input("X", 1, None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_swaps_image_and_cleans_old() {
        let f = fixture();
        let item = f.svc.create(f.user, f.category, input("Stew", 900, Some("aGk="))).await.unwrap();
        let old = item.image.unwrap().path;

        let updated = f.svc.update(f.user, item.id, input("Beef stew", 1100, Some("aGk="))).await.unwrap();

        assert_eq!(updated.name, "Beef stew");
        assert_eq!(updated.price, 1100);
        assert_ne!(updated.image.unwrap().path, old);
        assert!(f.images.calls().contains(&ImageCall::Delete(old)));
        assert!(f.store.pending_paths().is_empty());
        assert_eq!(f.store.image_count(), 1);
    }

    #[tokio::test]
    async fn update_leaves_failed_cleanup_queued() {
        let f = fixture();
        let item = f.svc.create(f.user, f.category, input("Stew", 900, Some("aGk="))).await.unwrap();
        let old = item.image.unwrap().path;
        f.images.fail_deletes(true);

        f.svc.update(f.user, item.id, input("Stew", 900, Some("aGk="))).await.unwrap();

        assert_eq!(f.store.pending_paths(), vec![old]);
    }

    #[tokio::test]
    async fn delete_removes_item_and_image() {
        let f = fixture();
        let item = f.svc.create(f.user, f.category, input("Stew", 900, Some("aGk="))).await.unwrap();
        assert!(matches!(f.svc.delete(Uuid::new_v4(), item.id).await, Err(ServiceError::NotFound(_))));

        f.svc.delete(f.user, item.id).await.unwrap();

        assert_eq!(f.store.item_count(), 0);
        assert_eq!(f.store.image_count(), 0);
        assert!(f.images.files().is_empty());
    }

    #[tokio::test]
    async fn reorder_items() {
        let f = fixture();
        let a = f.svc.create(f.user, f.category, input("A", 1, None)).await.unwrap();
        let b = f.svc.create(f.user, f.category, input("B", 1, None)).await.unwrap();
        let reorder = Reorder::new(vec![
            PositionUpdate { id: a.id, new_position: 1 },
            PositionUpdate { id: b.id, new_position: 0 },
        ])
        .unwrap();
        f.svc.update_position(f.user, reorder).await.unwrap();

        assert_eq!(f.svc.repo.find(a.id, f.user).await.unwrap().unwrap().position, 1);
        assert_eq!(f.svc.repo.find(b.id, f.user).await.unwrap().unwrap().position, 0);

        let foreign = Reorder::new(vec![PositionUpdate { id: a.id, new_position: 9 }]).unwrap();
        assert!(matches!(f.svc.update_position(Uuid::new_v4(), foreign).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_image_analysis_removes_the_upload() {
        let f = fixture();
        f.images.fail_analysis(true);

        let err = f.svc.create(f.user, f.category, input("Stew", 900, Some("aGk="))).await.unwrap_err();

        assert!(matches!(err, ServiceError::ImageStore(_)));
        assert_eq!(f.store.item_count(), 0);
        assert!(f.images.files().is_empty());
        assert!(f.store.pending_paths().is_empty());
    }
}
