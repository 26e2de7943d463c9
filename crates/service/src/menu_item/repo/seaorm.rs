use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set, TransactionTrait};
use uuid::Uuid;

use models::{asset_deletion, category, image, menu_item};

use crate::errors::ServiceError;
use crate::menu_item::repository::{ItemChanges, MenuItemRepository, NewImage, NewMenuItem};
use crate::records::MenuItemRecord;
use crate::validation::PositionUpdate;

pub struct SeaOrmMenuItemRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmMenuItemRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

async fn insert_image<C: ConnectionTrait>(db: &C, user_id: Uuid, img: NewImage) -> Result<image::Model, ServiceError> {
    Ok(image::create(db, user_id, &img.path, img.blur_hash, img.dominant_color).await?)
}

async fn load<C: ConnectionTrait>(db: &C, item: menu_item::Model) -> Result<MenuItemRecord, ServiceError> {
    let img = match item.image_id {
        Some(id) => image::Entity::find_by_id(id).one(db).await?,
        None => None,
    };
    Ok(MenuItemRecord::from_model(item, img))
}

#[async_trait::async_trait]
impl MenuItemRepository for SeaOrmMenuItemRepository {
    async fn category_menu(&self, category_id: Uuid, user_id: Uuid) -> Result<Option<Uuid>, ServiceError> {
        Ok(category::find_owned(&self.db, category_id, user_id).await?.map(|c| c.menu_id))
    }

    async fn create(&self, input: NewMenuItem) -> Result<MenuItemRecord, ServiceError> {
        let txn = self.db.begin().await?;
        let img = match input.image {
            Some(i) => Some(insert_image(&txn, input.user_id, i).await?),
            None => None,
        };
        let position = menu_item::next_position(&txn, input.category_id).await?;
        let created = menu_item::create(&txn, menu_item::NewItem {
            category_id: input.category_id,
            user_id: input.user_id,
            name: &input.name,
            description: input.description.as_deref(),
            price: input.price,
            position,
            image_id: img.as_ref().map(|i| i.id),
        })
        .await?;
        txn.commit().await?;
        Ok(MenuItemRecord::from_model(created, img))
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<MenuItemRecord>, ServiceError> {
        match menu_item::find_owned(&self.db, id, user_id).await? {
            Some(item) => Ok(Some(load(&self.db, item).await?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: Uuid, user_id: Uuid, changes: ItemChanges, stale_assets: &[String]) -> Result<Option<MenuItemRecord>, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(found) = menu_item::find_owned(&txn, id, user_id).await? else { return Ok(None) };
        let previous_image = found.image_id;

        let mut am = found.into_active_model();
        am.name = Set(changes.name);
        am.description = Set(changes.description);
        am.price = Set(changes.price);
        am.updated_at = Set(Utc::now().into());
        let replaced = changes.image.is_some();
        if let Some(img) = changes.image {
            let row = insert_image(&txn, user_id, img).await?;
            am.image_id = Set(Some(row.id));
        }
        let updated = am.update(&txn).await?;
        if replaced {
            image::delete_many(&txn, previous_image.into_iter().collect()).await?;
            asset_deletion::enqueue(&txn, stale_assets).await?;
        }
        let record = load(&txn, updated).await?;
        txn.commit().await?;
        Ok(Some(record))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid, asset_paths: &[String]) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(found) = menu_item::find_owned(&txn, id, user_id).await? else { return Ok(false) };
        menu_item::Entity::delete_by_id(found.id).exec(&txn).await?;
        image::delete_many(&txn, found.image_id.into_iter().collect()).await?;
        asset_deletion::enqueue(&txn, asset_paths).await?;
        txn.commit().await?;
        Ok(true)
    }

    async fn reorder(&self, user_id: Uuid, updates: &[PositionUpdate]) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        for u in updates {
            if menu_item::set_position(&txn, u.id, user_id, u.new_position).await? == 0 {
                return Err(ServiceError::not_found("menu item"));
            }
        }
        txn.commit().await?;
        Ok(())
    }
}
