//! In-memory implementation of every repository and the asset queue, for
//! tests and for running the HTTP layer without a database.
//!
//! One mutex guards all tables, so each call is atomic the way a database
//! transaction would be.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::assets::{AssetQueue, PendingAsset};
use crate::category::repository::{CategoryRepository, NewCategory};
use crate::errors::ServiceError;
use crate::menu::repository::MenuRepository;
use crate::menu_item::repository::{ItemChanges, MenuItemRepository, NewImage, NewMenuItem};
use crate::records::{CategoryRecord, ImageRecord, MenuItemRecord, MenuRecord};
use crate::validation::PositionUpdate;

#[derive(Clone)]
struct CategoryRow {
    id: Uuid,
    menu_id: Uuid,
    user_id: Uuid,
    name: String,
    position: i32,
    image_url: Option<String>,
}

#[derive(Clone)]
struct ItemRow {
    id: Uuid,
    category_id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    position: i32,
    image_id: Option<Uuid>,
}

#[derive(Default)]
struct Tables {
    menus: Vec<MenuRecord>,
    categories: Vec<CategoryRow>,
    items: Vec<ItemRow>,
    images: HashMap<Uuid, ImageRecord>,
    assets: Vec<PendingAsset>,
}

impl Tables {
    fn item_record(&self, row: &ItemRow) -> MenuItemRecord {
        MenuItemRecord {
            id: row.id,
            category_id: row.category_id,
            name: row.name.clone(),
            description: row.description.clone(),
            price: row.price,
            position: row.position,
            image_id: row.image_id,
            image: row.image_id.and_then(|id| self.images.get(&id).cloned()),
        }
    }

    fn category_record(&self, row: &CategoryRow) -> CategoryRecord {
        let mut items: Vec<&ItemRow> = self.items.iter().filter(|i| i.category_id == row.id).collect();
        items.sort_by_key(|i| i.position);
        CategoryRecord {
            id: row.id,
            menu_id: row.menu_id,
            user_id: row.user_id,
            name: row.name.clone(),
            position: row.position,
            image_url: row.image_url.clone(),
            items: items.into_iter().map(|i| self.item_record(i)).collect(),
        }
    }

    fn owned_categories(&self, menu_id: Uuid, user_id: Uuid) -> Vec<CategoryRecord> {
        let mut rows: Vec<&CategoryRow> = self
            .categories
            .iter()
            .filter(|c| c.menu_id == menu_id && c.user_id == user_id)
            .collect();
        rows.sort_by_key(|c| c.position);
        rows.into_iter().map(|c| self.category_record(c)).collect()
    }

    fn insert_image(&mut self, img: NewImage) -> Uuid {
        let id = Uuid::new_v4();
        self.images.insert(id, ImageRecord { id, path: img.path, blur_hash: img.blur_hash, dominant_color: img.dominant_color });
        id
    }

    fn enqueue(&mut self, paths: &[String]) {
        for p in paths {
            if !self.assets.iter().any(|a| &a.path == p) {
                self.assets.push(PendingAsset { path: p.clone(), attempts: 0 });
            }
        }
    }

    fn drop_items_of(&mut self, category_ids: &[Uuid]) {
        let (gone, kept): (Vec<ItemRow>, Vec<ItemRow>) =
            self.items.drain(..).partition(|i| category_ids.contains(&i.category_id));
        self.items = kept;
        for item in gone {
            if let Some(img) = item.image_id {
                self.images.remove(&img);
            }
        }
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // a poisoned lock only means another test thread panicked
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn seed_menu(&self, user_id: Uuid, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().menus.push(MenuRecord { id, user_id, name: name.to_string(), description: None, created_at: Utc::now() });
        id
    }

    pub fn seed_category(&self, user_id: Uuid, menu_id: Uuid, name: &str, image_url: Option<&str>) -> Uuid {
        let mut t = self.lock();
        let position = t.categories.iter().filter(|c| c.menu_id == menu_id).map(|c| c.position + 1).max().unwrap_or(0);
        let id = Uuid::new_v4();
        t.categories.push(CategoryRow { id, menu_id, user_id, name: name.to_string(), position, image_url: image_url.map(str::to_string) });
        id
    }

    pub fn seed_item(&self, user_id: Uuid, category_id: Uuid, name: &str, image_path: Option<&str>) -> Uuid {
        let mut t = self.lock();
        let image_id = image_path.map(|p| t.insert_image(NewImage { path: p.to_string(), blur_hash: None, dominant_color: None }));
        let position = t.items.iter().filter(|i| i.category_id == category_id).map(|i| i.position + 1).max().unwrap_or(0);
        let id = Uuid::new_v4();
        t.items.push(ItemRow { id, category_id, user_id, name: name.to_string(), description: None, price: 0, position, image_id });
        id
    }

    pub fn item_count(&self) -> usize { self.lock().items.len() }

    pub fn image_count(&self) -> usize { self.lock().images.len() }

    /// Queued asset paths, oldest first.
    pub fn pending_paths(&self) -> Vec<String> { self.lock().assets.iter().map(|a| a.path.clone()).collect() }
}

#[async_trait]
impl MenuRepository for InMemoryStore {
    async fn create(&self, user_id: Uuid, name: &str, description: Option<&str>) -> Result<MenuRecord, ServiceError> {
        let menu = MenuRecord {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
        };
        self.lock().menus.push(menu.clone());
        Ok(menu)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<MenuRecord>, ServiceError> {
        let mut menus: Vec<MenuRecord> = self.lock().menus.iter().filter(|m| m.user_id == user_id).cloned().collect();
        menus.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(menus)
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<MenuRecord>, ServiceError> {
        Ok(self.lock().menus.iter().find(|m| m.id == id && m.user_id == user_id).cloned())
    }

    async fn update(&self, id: Uuid, user_id: Uuid, name: &str, description: Option<&str>) -> Result<Option<MenuRecord>, ServiceError> {
        let mut t = self.lock();
        let Some(m) = t.menus.iter_mut().find(|m| m.id == id && m.user_id == user_id) else { return Ok(None) };
        m.name = name.to_string();
        m.description = description.map(str::to_string);
        Ok(Some(m.clone()))
    }

    async fn delete_cascade(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<String>>, ServiceError> {
        let mut t = self.lock();
        if !t.menus.iter().any(|m| m.id == id && m.user_id == user_id) {
            return Ok(None);
        }
        let mut paths = Vec::new();
        for c in t.owned_categories(id, user_id) {
            paths.extend(c.image_url.iter().cloned());
            paths.extend(c.item_image_paths());
        }
        let category_ids: Vec<Uuid> = t.categories.iter().filter(|c| c.menu_id == id).map(|c| c.id).collect();
        t.drop_items_of(&category_ids);
        t.categories.retain(|c| c.menu_id != id);
        t.menus.retain(|m| m.id != id);
        t.enqueue(&paths);
        Ok(Some(paths))
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn menu_owned(&self, menu_id: Uuid, user_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.lock().menus.iter().any(|m| m.id == menu_id && m.user_id == user_id))
    }

    async fn create(&self, input: NewCategory) -> Result<CategoryRecord, ServiceError> {
        let mut t = self.lock();
        let position = t
            .categories
            .iter()
            .filter(|c| c.menu_id == input.menu_id)
            .map(|c| c.position + 1)
            .max()
            .unwrap_or(0);
        let row = CategoryRow {
            id: Uuid::new_v4(),
            menu_id: input.menu_id,
            user_id: input.user_id,
            name: input.name,
            position,
            image_url: input.image_url,
        };
        t.categories.push(row.clone());
        Ok(t.category_record(&row))
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<CategoryRecord>, ServiceError> {
        let t = self.lock();
        Ok(t.categories.iter().find(|c| c.id == id && c.user_id == user_id).map(|c| t.category_record(c)))
    }

    async fn list_by_menu(&self, menu_id: Uuid, user_id: Uuid) -> Result<Vec<CategoryRecord>, ServiceError> {
        Ok(self.lock().owned_categories(menu_id, user_id))
    }

    async fn update(&self, id: Uuid, user_id: Uuid, name: &str, image_url: Option<String>) -> Result<Option<CategoryRecord>, ServiceError> {
        let mut t = self.lock();
        let Some(row) = t.categories.iter_mut().find(|c| c.id == id && c.user_id == user_id) else { return Ok(None) };
        row.name = name.to_string();
        if image_url.is_some() {
            row.image_url = image_url;
        }
        let row = row.clone();
        Ok(Some(t.category_record(&row)))
    }

    async fn delete_cascade(&self, id: Uuid, user_id: Uuid, asset_paths: &[String]) -> Result<bool, ServiceError> {
        let mut t = self.lock();
        if !t.categories.iter().any(|c| c.id == id && c.user_id == user_id) {
            return Ok(false);
        }
        t.drop_items_of(&[id]);
        t.categories.retain(|c| c.id != id);
        t.enqueue(asset_paths);
        Ok(true)
    }

    async fn reorder(&self, user_id: Uuid, updates: &[PositionUpdate]) -> Result<(), ServiceError> {
        let mut t = self.lock();
        if !updates.iter().all(|u| t.categories.iter().any(|c| c.id == u.id && c.user_id == user_id)) {
            return Err(ServiceError::not_found("category"));
        }
        for u in updates {
            if let Some(c) = t.categories.iter_mut().find(|c| c.id == u.id) {
                c.position = u.new_position;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MenuItemRepository for InMemoryStore {
    async fn category_menu(&self, category_id: Uuid, user_id: Uuid) -> Result<Option<Uuid>, ServiceError> {
        Ok(self.lock().categories.iter().find(|c| c.id == category_id && c.user_id == user_id).map(|c| c.menu_id))
    }

    async fn create(&self, input: NewMenuItem) -> Result<MenuItemRecord, ServiceError> {
        let mut t = self.lock();
        let image_id = input.image.map(|img| t.insert_image(img));
        let position = t
            .items
            .iter()
            .filter(|i| i.category_id == input.category_id)
            .map(|i| i.position + 1)
            .max()
            .unwrap_or(0);
        let row = ItemRow {
            id: Uuid::new_v4(),
            category_id: input.category_id,
            user_id: input.user_id,
            name: input.name,
            description: input.description,
            price: input.price,
            position,
            image_id,
        };
        t.items.push(row.clone());
        Ok(t.item_record(&row))
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<MenuItemRecord>, ServiceError> {
        let t = self.lock();
        Ok(t.items.iter().find(|i| i.id == id && i.user_id == user_id).map(|i| t.item_record(i)))
    }

    async fn update(&self, id: Uuid, user_id: Uuid, changes: ItemChanges, stale_assets: &[String]) -> Result<Option<MenuItemRecord>, ServiceError> {
        let mut t = self.lock();
        let Some(idx) = t.items.iter().position(|i| i.id == id && i.user_id == user_id) else { return Ok(None) };
        if let Some(img) = changes.image {
            let new_id = t.insert_image(img);
            let previous = t.items[idx].image_id.replace(new_id);
            if let Some(old) = previous {
                t.images.remove(&old);
            }
            t.enqueue(stale_assets);
        }
        let row = &mut t.items[idx];
        row.name = changes.name;
        row.description = changes.description;
        row.price = changes.price;
        let row = row.clone();
        Ok(Some(t.item_record(&row)))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid, asset_paths: &[String]) -> Result<bool, ServiceError> {
        let mut t = self.lock();
        let Some(idx) = t.items.iter().position(|i| i.id == id && i.user_id == user_id) else { return Ok(false) };
        let row = t.items.remove(idx);
        if let Some(img) = row.image_id {
            t.images.remove(&img);
        }
        t.enqueue(asset_paths);
        Ok(true)
    }

    async fn reorder(&self, user_id: Uuid, updates: &[PositionUpdate]) -> Result<(), ServiceError> {
        let mut t = self.lock();
        if !updates.iter().all(|u| t.items.iter().any(|i| i.id == u.id && i.user_id == user_id)) {
            return Err(ServiceError::not_found("menu item"));
        }
        for u in updates {
            if let Some(i) = t.items.iter_mut().find(|i| i.id == u.id) {
                i.position = u.new_position;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AssetQueue for InMemoryStore {
    async fn enqueue(&self, paths: &[String]) -> Result<(), ServiceError> {
        self.lock().enqueue(paths);
        Ok(())
    }

    async fn clear(&self, paths: &[String]) -> Result<(), ServiceError> {
        self.lock().assets.retain(|a| !paths.contains(&a.path));
        Ok(())
    }

    async fn record_failure(&self, paths: &[String], _error: &str) -> Result<(), ServiceError> {
        for a in self.lock().assets.iter_mut().filter(|a| paths.contains(&a.path)) {
            a.attempts += 1;
        }
        Ok(())
    }

    async fn pending(&self, limit: u64) -> Result<Vec<PendingAsset>, ServiceError> {
        let mut rows = self.lock().assets.clone();
        rows.sort_by_key(|a| a.attempts);
        rows.truncate(limit as usize);
        Ok(rows)
    }
}
