use chrono::Utc;
use sea_orm::{entity::prelude::*, sea_query::Expr, ConnectionTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, menu, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub menu_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub position: i32,
    pub image_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Menu, User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Menu => Entity::belongs_to(menu::Entity)
                .from(Column::MenuId)
                .to(menu::Column::Id)
                .into(),
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Position a new category gets in `menu_id`: max + 1, or 0 for an empty menu.
pub async fn next_position<C: ConnectionTrait>(db: &C, menu_id: Uuid) -> Result<i32, ModelError> {
    let last = Entity::find()
        .filter(Column::MenuId.eq(menu_id))
        .order_by_desc(Column::Position)
        .limit(1)
        .one(db)
        .await?;
    Ok(last.map(|c| c.position + 1).unwrap_or(0))
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    menu_id: Uuid,
    user_id: Uuid,
    name: &str,
    position: i32,
    image_url: Option<String>,
) -> Result<Model, ModelError> {
    let name = menu::validate_display_name(name)?;
    let now: DateTimeWithTimeZone = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        menu_id: Set(menu_id),
        user_id: Set(user_id),
        name: Set(name),
        position: Set(position),
        image_url: Set(image_url),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

/// Owner-scoped position write; returns the number of rows touched (0 or 1).
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

pub async fn list_by_menu<C: ConnectionTrait>(db: &C, menu_id: Uuid, user_id: Uuid) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .filter(Column::MenuId.eq(menu_id))
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::Position)
        .all(db)
        .await?)
}
