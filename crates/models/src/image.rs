use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub path: String,
    pub blur_hash: Option<String>,
    pub dominant_color: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { User }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    path: &str,
    blur_hash: Option<String>,
    dominant_color: Option<String>,
) -> Result<Model, ModelError> {
    if path.trim().is_empty() {
        return Err(ModelError::Validation("image path required".into()));
    }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        path: Set(path.to_string()),
        blur_hash: Set(blur_hash),
        dominant_color: Set(dominant_color),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_many<C: ConnectionTrait>(db: &C, ids: Vec<Uuid>) -> Result<Vec<Model>, ModelError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(Entity::find().filter(Column::Id.is_in(ids)).all(db).await?)
}

pub async fn delete_many<C: ConnectionTrait>(db: &C, ids: Vec<Uuid>) -> Result<u64, ModelError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let res = Entity::delete_many().filter(Column::Id.is_in(ids)).exec(db).await?;
    Ok(res.rows_affected)
}
