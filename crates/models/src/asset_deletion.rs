use sea_orm::{entity::prelude::*, sea_query::{Expr, OnConflict}, ConnectionTrait, QueryOrder, QuerySelect, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Image-store path queued for removal once the rows pointing at it are gone.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "asset_deletion")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub path: String,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

/// Queue paths; already queued paths are left untouched.
pub async fn enqueue<C: ConnectionTrait>(db: &C, paths: &[String]) -> Result<(), ModelError> {
    if paths.is_empty() {
        return Ok(());
    }
    let now: DateTimeWithTimeZone = Utc::now().into();
    let rows = paths.iter().map(|p| ActiveModel {
        id: Set(Uuid::new_v4()),
        path: Set(p.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
    });
    Entity::insert_many(rows)
        .on_conflict(OnConflict::column(Column::Path).do_nothing().to_owned())
        .do_nothing()
        .exec(db)
        .await?;
    Ok(())
}

pub async fn clear<C: ConnectionTrait>(db: &C, paths: &[String]) -> Result<u64, ModelError> {
    if paths.is_empty() {
        return Ok(0);
    }
    let res = Entity::delete_many()
        .filter(Column::Path.is_in(paths.iter().cloned()))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn record_failure<C: ConnectionTrait>(db: &C, paths: &[String], error: &str) -> Result<(), ModelError> {
    if paths.is_empty() {
        return Ok(());
    }
    Entity::update_many()
        .col_expr(Column::Attempts, Expr::col(Column::Attempts).add(1))
        .col_expr(Column::LastError, Expr::value(Some(error.to_string())))
        .filter(Column::Path.is_in(paths.iter().cloned()))
        .exec(db)
        .await?;
    Ok(())
}

/// Fewest attempts first, then oldest.
pub async fn pending<C: ConnectionTrait>(db: &C, limit: u64) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find()
        .order_by_asc(Column::Attempts)
        .order_by_asc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?)
}
