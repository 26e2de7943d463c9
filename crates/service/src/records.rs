//! Business views of stored rows, decoupled from the sea-orm entities.
//! These are what services return and what the HTTP layer serialises.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: Uuid,
    pub path: String,
    pub blur_hash: Option<String>,
    pub dominant_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemRecord {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub position: i32,
    pub image_id: Option<Uuid>,
    pub image: Option<ImageRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: Uuid,
    pub menu_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub position: i32,
    pub image_url: Option<String>,
    pub items: Vec<MenuItemRecord>,
}

impl CategoryRecord {
    /// Storage paths of the item images nested in this category.
    pub fn item_image_paths(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|i| i.image.as_ref().map(|img| img.path.clone()))
            .collect()
    }
}

impl From<models::menu::Model> for MenuRecord {
    fn from(m: models::menu::Model) -> Self {
        Self { id: m.id, user_id: m.user_id, name: m.name, description: m.description, created_at: m.created_at.with_timezone(&Utc) }
    }
}

impl From<models::image::Model> for ImageRecord {
    fn from(m: models::image::Model) -> Self {
        Self { id: m.id, path: m.path, blur_hash: m.blur_hash, dominant_color: m.dominant_color }
    }
}

impl MenuItemRecord {
    pub fn from_model(m: models::menu_item::Model, image: Option<models::image::Model>) -> Self {
        Self {
            id: m.id,
            category_id: m.category_id,
            name: m.name,
            description: m.description,
            price: m.price,
            position: m.position,
            image_id: m.image_id,
            image: image.map(ImageRecord::from),
        }
    }
}

impl CategoryRecord {
    pub fn from_model(m: models::category::Model, items: Vec<MenuItemRecord>) -> Self {
        Self {
            id: m.id,
            menu_id: m.menu_id,
            user_id: m.user_id,
            name: m.name,
            position: m.position,
            image_url: m.image_url,
            items,
        }
    }
}
