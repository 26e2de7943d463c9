use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, Set, TransactionTrait};
use uuid::Uuid;

use models::{asset_deletion, category, menu};

use crate::category::repo::seaorm::{delete_items_of, with_items};
use crate::errors::ServiceError;
use crate::menu::repository::MenuRepository;
use crate::records::MenuRecord;

pub struct SeaOrmMenuRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmMenuRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait::async_trait]
impl MenuRepository for SeaOrmMenuRepository {
    async fn create(&self, user_id: Uuid, name: &str, description: Option<&str>) -> Result<MenuRecord, ServiceError> {
        Ok(menu::create(&self.db, user_id, name, description).await?.into())
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<MenuRecord>, ServiceError> {
        Ok(menu::list_owned(&self.db, user_id).await?.into_iter().map(MenuRecord::from).collect())
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<MenuRecord>, ServiceError> {
        Ok(menu::find_owned(&self.db, id, user_id).await?.map(MenuRecord::from))
    }

    async fn update(&self, id: Uuid, user_id: Uuid, name: &str, description: Option<&str>) -> Result<Option<MenuRecord>, ServiceError> {
        let Some(found) = menu::find_owned(&self.db, id, user_id).await? else { return Ok(None) };
        let mut am = found.into_active_model();
        am.name = Set(name.to_string());
        am.description = Set(description.map(str::to_string));
        am.updated_at = Set(Utc::now().into());
        Ok(Some(am.update(&self.db).await?.into()))
    }

    async fn delete_cascade(&self, id: Uuid, user_id: Uuid) -> Result<Option<Vec<String>>, ServiceError> {
        let txn = self.db.begin().await?;
        if menu::find_owned(&txn, id, user_id).await?.is_none() {
            return Ok(None);
        }
        let categories = with_items(&txn, category::list_by_menu(&txn, id, user_id).await?).await?;
        let mut paths = Vec::new();
        for c in &categories {
            paths.extend(c.image_url.iter().cloned());
            paths.extend(c.item_image_paths());
        }
        let category_ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();
        delete_items_of(&txn, category_ids).await?;
        category::Entity::delete_many().filter(category::Column::MenuId.eq(id)).exec(&txn).await?;
        menu::Entity::delete_by_id(id).exec(&txn).await?;
        asset_deletion::enqueue(&txn, &paths).await?;
        txn.commit().await?;
        Ok(Some(paths))
    }
}
