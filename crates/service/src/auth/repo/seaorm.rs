use models::errors::ModelError;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::domain::{AuthUser, SignInIdentity};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn upsert_user(&self, identity: &SignInIdentity, fixed_id: Option<Uuid>) -> Result<AuthUser, AuthError> {
        let u = models::user::upsert_identity(&self.db, fixed_id, models::user::Identity {
            provider: &identity.provider,
            subject: &identity.subject,
            email: &identity.email,
            name: &identity.name,
            image: identity.image.as_deref(),
        })
        .await
        .map_err(|e| match e {
            ModelError::Validation(m) => AuthError::Validation(m),
            other => AuthError::Repository(other.to_string()),
        })?;
        Ok(AuthUser { id: u.id, email: u.email, name: u.name, image: u.image })
    }
}
