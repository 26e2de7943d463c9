//! Image store collaborator: binary asset upload/removal plus the perceptual
//! hash and dominant colour of an uploaded picture.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validation::ImagePayload;

pub use http::HttpImageStore;
pub use mock::MockImageStore;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImageStoreError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("image store returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub path: String,
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: &ImagePayload, destination: &str) -> Result<StoredImage, ImageStoreError>;
    async fn delete_file(&self, path: &str) -> Result<(), ImageStoreError>;
    async fn bulk_delete_files(&self, paths: &[String]) -> Result<(), ImageStoreError>;
    async fn perceptual_hash(&self, image: &ImagePayload) -> Result<String, ImageStoreError>;
    async fn dominant_color(&self, image: &ImagePayload) -> Result<String, ImageStoreError>;
}

/// Destination for a category picture; scoped to the owner.
pub fn category_image_path(user_id: uuid::Uuid, menu_id: uuid::Uuid) -> String {
    format!("{}/menus/{}/categories/{}", user_id, menu_id, uuid::Uuid::new_v4())
}

/// Destination for a menu item picture; scoped to the owner.
pub fn item_image_path(user_id: uuid::Uuid, menu_id: uuid::Uuid) -> String {
    format!("{}/menus/{}/items/{}", user_id, menu_id, uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn paths_are_user_scoped_and_unique() {
        let (u, m) = (Uuid::new_v4(), Uuid::new_v4());
        let a = category_image_path(u, m);
        let b = category_image_path(u, m);
        assert!(a.starts_with(&format!("{u}/menus/{m}/categories/")));
        assert_ne!(a, b);
        assert!(item_image_path(u, m).starts_with(&format!("{u}/menus/{m}/items/")));
    }
}
