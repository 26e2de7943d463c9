use chrono::Utc;
use sea_orm::{entity::prelude::*, sea_query::Expr, ConnectionTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::{category, errors::ModelError, image, menu, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Minor currency units.
    pub price: i64,
    pub position: i32,
    pub image_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Category, User, Image }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Category => Entity::belongs_to(category::Entity)
                .from(Column::CategoryId)
                .to(category::Column::Id)
                .into(),
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
            Relation::Image => Entity::belongs_to(image::Entity)
                .from(Column::ImageId)
                .to(image::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_price(price: i64) -> Result<(), ModelError> {
    if price < 0 {
        return Err(ModelError::Validation("price must be >= 0".into()));
    }
    Ok(())
}

pub async fn next_position<C: ConnectionTrait>(db: &C, category_id: Uuid) -> Result<i32, ModelError> {
    let last = Entity::find()
        .filter(Column::CategoryId.eq(category_id))
        .order_by_desc(Column::Position)
        .limit(1)
        .one(db)
        .await?;
    Ok(last.map(|i| i.position + 1).unwrap_or(0))
}

/// Column values of a new item; position is assigned by the caller.
#[derive(Debug, Clone)]
pub struct NewItem<'a> {
    pub category_id: Uuid,
    pub user_id: Uuid,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: i64,
    pub position: i32,
    pub image_id: Option<Uuid>,
}

pub async fn create<C: ConnectionTrait>(db: &C, item: NewItem<'_>) -> Result<Model, ModelError> {
    let name = menu::validate_display_name(item.name)?;
    validate_price(item.price)?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        category_id: Set(item.category_id),
        user_id: Set(item.user_id),
        name: Set(name),
        description: Set(item.description.map(str::to_string)),
        price: Set(item.price),
        position: Set(item.position),
        image_id: Set(item.image_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn set_position<C: ConnectionTrait>(db: &C, id: Uuid, user_id: Uuid, position: i32) -> Result<u64, ModelError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let res = Entity::update_many()
        .col_expr(Column::Position, Expr::value(position))
        .col_expr(Column::UpdatedAt, Expr::value(now))
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn find_owned<C: ConnectionTrait>(db: &C, id: Uuid, user_id: Uuid) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

/// Items of several categories, ordered by (category, position).
pub async fn list_by_categories<C: ConnectionTrait>(db: &C, category_ids: Vec<Uuid>) -> Result<Vec<Model>, ModelError> {
    if category_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Entity::find()
        .filter(Column::CategoryId.is_in(category_ids))
        .order_by_asc(Column::CategoryId)
        .order_by_asc(Column::Position)
        .all(db)
        .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_price_rejected() {
        assert!(validate_price(-1).is_err());
        assert!(validate_price(0).is_ok());
        assert!(validate_price(1250).is_ok());
    }
}
