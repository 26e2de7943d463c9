use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use models::{asset_deletion, category, image, menu, menu_item};

use crate::category::repository::{CategoryRepository, NewCategory};
use crate::errors::ServiceError;
use crate::records::{CategoryRecord, MenuItemRecord};
use crate::validation::PositionUpdate;

pub struct SeaOrmCategoryRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

/// Attach items (position order) and their images to `categories`, keeping
/// the input order.
pub(crate) async fn with_items<C: ConnectionTrait>(db: &C, categories: Vec<category::Model>) -> Result<Vec<CategoryRecord>, ServiceError> {
    let ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
    let items = menu_item::list_by_categories(db, ids).await?;
    let image_ids: Vec<Uuid> = items.iter().filter_map(|i| i.image_id).collect();
    let mut images: HashMap<Uuid, image::Model> = image::find_many(db, image_ids)
        .await?
        .into_iter()
        .map(|img| (img.id, img))
        .collect();

    let mut grouped: HashMap<Uuid, Vec<MenuItemRecord>> = HashMap::new();
    for item in items {
        let img = item.image_id.and_then(|id| images.remove(&id));
        grouped.entry(item.category_id).or_default().push(MenuItemRecord::from_model(item, img));
    }
    Ok(categories
        .into_iter()
        .map(|c| {
            let items = grouped.remove(&c.id).unwrap_or_default();
            CategoryRecord::from_model(c, items)
        })
        .collect())
}

/// Delete the items of `category_ids` and the image rows they reference.
pub(crate) async fn delete_items_of<C: ConnectionTrait>(db: &C, category_ids: Vec<Uuid>) -> Result<(), ServiceError> {
    if category_ids.is_empty() {
        return Ok(());
    }
    let items = menu_item::Entity::find()
        .filter(menu_item::Column::CategoryId.is_in(category_ids.clone()))
        .all(db)
        .await?;
    let image_ids: Vec<Uuid> = items.iter().filter_map(|i| i.image_id).collect();
    menu_item::Entity::delete_many()
        .filter(menu_item::Column::CategoryId.is_in(category_ids))
        .exec(db)
        .await?;
    image::delete_many(db, image_ids).await?;
    Ok(())
}

#[async_trait::async_trait]
impl CategoryRepository for SeaOrmCategoryRepository {
    async fn menu_owned(&self, menu_id: Uuid, user_id: Uuid) -> Result<bool, ServiceError> {
        Ok(menu::find_owned(&self.db, menu_id, user_id).await?.is_some())
    }

    async fn create(&self, input: NewCategory) -> Result<CategoryRecord, ServiceError> {
        let txn = self.db.begin().await?;
        let position = category::next_position(&txn, input.menu_id).await?;
        let created = category::create(&txn, input.menu_id, input.user_id, &input.name, position, input.image_url).await?;
        txn.commit().await?;
        Ok(CategoryRecord::from_model(created, Vec::new()))
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<CategoryRecord>, ServiceError> {
        let Some(found) = category::find_owned(&self.db, id, user_id).await? else { return Ok(None) };
        Ok(with_items(&self.db, vec![found]).await?.pop())
    }

    async fn list_by_menu(&self, menu_id: Uuid, user_id: Uuid) -> Result<Vec<CategoryRecord>, ServiceError> {
        let categories = category::list_by_menu(&self.db, menu_id, user_id).await?;
        with_items(&self.db, categories).await
    }

    async fn update(&self, id: Uuid, user_id: Uuid, name: &str, image_url: Option<String>) -> Result<Option<CategoryRecord>, ServiceError> {
        let Some(found) = category::find_owned(&self.db, id, user_id).await? else { return Ok(None) };
        let mut am = found.into_active_model();
        am.name = Set(name.to_string());
        if let Some(url) = image_url {
            am.image_url = Set(Some(url));
        }
        am.updated_at = Set(Utc::now().into());
        let updated = am.update(&self.db).await?;
        Ok(with_items(&self.db, vec![updated]).await?.pop())
    }

    async fn delete_cascade(&self, id: Uuid, user_id: Uuid, asset_paths: &[String]) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;
        if category::find_owned(&txn, id, user_id).await?.is_none() {
            return Ok(false);
        }
        delete_items_of(&txn, vec![id]).await?;
        category::Entity::delete_by_id(id).exec(&txn).await?;
        asset_deletion::enqueue(&txn, asset_paths).await?;
        txn.commit().await?;
        Ok(true)
    }

    async fn reorder(&self, user_id: Uuid, updates: &[PositionUpdate]) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        for u in updates {
            if category::set_position(&txn, u.id, user_id, u.new_position).await? == 0 {
                // dropping txn rolls back
                return Err(ServiceError::not_found("category"));
            }
        }
        txn.commit().await?;
        Ok(())
    }
}
