use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub provider: String,
    pub provider_subject: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && email.len() <= 320 => Ok(()),
        _ => Err(ModelError::Validation("invalid email".into())),
    }
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() { return Err(ModelError::Validation("name required".into())); }
    if name.chars().count() > 200 { return Err(ModelError::Validation("name too long (<=200)".into())); }
    Ok(())
}

/// Profile fields handed over by a sign-in strategy.
#[derive(Clone, Debug)]
pub struct Identity<'a> {
    pub provider: &'a str,
    pub subject: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub image: Option<&'a str>,
}

/// Insert or refresh the user keyed by (provider, subject).
pub async fn upsert_identity<C: ConnectionTrait>(db: &C, id: Option<Uuid>, identity: Identity<'_>) -> Result<Model, ModelError> {
    validate_email(identity.email)?;
    validate_name(identity.name)?;
    let now = Utc::now().into();
    let existing = Entity::find()
        .filter(Column::Provider.eq(identity.provider))
        .filter(Column::ProviderSubject.eq(identity.subject))
        .one(db)
        .await?;
    if let Some(found) = existing {
        let mut am: ActiveModel = found.into();
        am.email = Set(identity.email.to_string());
        am.name = Set(identity.name.to_string());
        am.image = Set(identity.image.map(str::to_string));
        am.updated_at = Set(now);
        return Ok(am.update(db).await?);
    }
    let am = ActiveModel {
        id: Set(id.unwrap_or_else(Uuid::new_v4)),
        email: Set(identity.email.to_string()),
        name: Set(identity.name.to_string()),
        image: Set(identity.image.map(str::to_string)),
        provider: Set(identity.provider.to_string()),
        provider_subject: Set(identity.subject.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), ModelError> {
    Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}
