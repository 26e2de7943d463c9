use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::records::MenuRecord;

#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, name: &str, description: Option<&str>) -> Result<MenuRecord, ServiceError>;
    /// Newest first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<MenuRecord>, ServiceError>;
    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<MenuRecord>, ServiceError>;
    async fn update(&self, id: Uuid, user_id: Uuid, name: &str, description: Option<&str>) -> Result<Option<MenuRecord>, ServiceError>;
    /// Categories, items, images and the menu in one transaction. The image
    /// paths found under the menu are read and queued inside that same
    /// transaction and returned; `None` when nothing matched.
    async fn delete_cascade(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<String>>, ServiceError>;
}
