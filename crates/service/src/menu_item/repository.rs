use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::records::MenuItemRecord;
use crate::validation::PositionUpdate;

/// Picture metadata to persist as an `image` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewImage {
    pub path: String,
    pub blur_hash: Option<String>,
    pub dominant_color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub category_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image: Option<NewImage>,
}

/// Replacement values; `image: None` keeps the current picture.
#[derive(Debug, Clone)]
pub struct ItemChanges {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image: Option<NewImage>,
}

#[async_trait]
pub trait MenuItemRepository: Send + Sync {
    /// Menu id of an owned category.
    async fn category_menu(&self, category_id: Uuid, user_id: Uuid) -> Result<Option<Uuid>, ServiceError>;

    /// Image row plus item at max position + 1 within the category.
    async fn create(&self, input: NewMenuItem) -> Result<MenuItemRecord, ServiceError>;

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<MenuItemRecord>, ServiceError>;

    /// With a new image the previous image row is dropped and `stale_assets`
    /// are queued, all in one transaction.
    async fn update(&self, id: Uuid, user_id: Uuid, changes: ItemChanges, stale_assets: &[String]) -> Result<Option<MenuItemRecord>, ServiceError>;

    /// Item and its image row, queuing `asset_paths`. `false` when nothing matched.
    async fn delete(&self, id: Uuid, user_id: Uuid, asset_paths: &[String]) -> Result<bool, ServiceError>;

    async fn reorder(&self, user_id: Uuid, updates: &[PositionUpdate]) -> Result<(), ServiceError>;
}
