use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::records::CategoryRecord;
use crate::validation::PositionUpdate;

/// Fields of a category about to be inserted. The repository assigns the
/// position.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub menu_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
}

/// Persistence for categories. Every call is scoped to `user_id`.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn menu_owned(&self, menu_id: Uuid, user_id: Uuid) -> Result<bool, ServiceError>;

    /// Insert at max position + 1 within the menu (0 for the first one).
    async fn create(&self, input: NewCategory) -> Result<CategoryRecord, ServiceError>;

    /// Category with its items and their images.
    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<CategoryRecord>, ServiceError>;

    /// Position ascending, items position ascending.
    async fn list_by_menu(&self, menu_id: Uuid, user_id: Uuid) -> Result<Vec<CategoryRecord>, ServiceError>;

    /// `image_url: None` keeps the current value.
    async fn update(&self, id: Uuid, user_id: Uuid, name: &str, image_url: Option<String>) -> Result<Option<CategoryRecord>, ServiceError>;

    /// One transaction: items, their images, the category, plus an asset
    /// deletion row per entry of `asset_paths`. `false` when nothing matched.
    async fn delete_cascade(&self, id: Uuid, user_id: Uuid, asset_paths: &[String]) -> Result<bool, ServiceError>;

    /// All-or-nothing; an id not owned by `user_id` yields `NotFound`.
    async fn reorder(&self, user_id: Uuid, updates: &[PositionUpdate]) -> Result<(), ServiceError>;
}
