use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::repository::MenuRepository;
use crate::assets::AssetCleaner;
use crate::errors::ServiceError;
use crate::records::MenuRecord;
use crate::validation::DisplayName;

#[derive(Clone)]
pub struct MenuService {
    repo: Arc<dyn MenuRepository>,
    cleaner: AssetCleaner,
}

impl MenuService {
    pub fn new(repo: Arc<dyn MenuRepository>, cleaner: AssetCleaner) -> Self { Self { repo, cleaner } }

    #[instrument(skip(self, name, description), fields(user_id = %user_id))]
    pub async fn create(&self, user_id: Uuid, name: DisplayName, description: Option<String>) -> Result<MenuRecord, ServiceError> {
        let created = self.repo.create(user_id, name.as_str(), description.as_deref()).await?;
        info!(menu_id = %created.id, "menu_created");
        Ok(created)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<MenuRecord>, ServiceError> {
        self.repo.list(user_id).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<MenuRecord, ServiceError> {
        self.repo.find(id, user_id).await?.ok_or_else(|| ServiceError::not_found("menu"))
    }

    #[instrument(skip(self, name, description), fields(user_id = %user_id, menu_id = %id))]
    pub async fn update(&self, user_id: Uuid, id: Uuid, name: DisplayName, description: Option<String>) -> Result<MenuRecord, ServiceError> {
        self.repo
            .update(id, user_id, name.as_str(), description.as_deref())
            .await?
            .ok_or_else(|| ServiceError::not_found("menu"))
    }

    /// Drop the menu with everything in it, then clean the image store.
    #[instrument(skip(self), fields(user_id = %user_id, menu_id = %id))]
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let paths = self.repo.delete_cascade(id, user_id).await?.ok_or_else(|| ServiceError::not_found("menu"))?;
        info!(assets = paths.len(), "menu_deleted");
        self.cleaner.remove(None, paths).await;
        Ok(())
    }
}
