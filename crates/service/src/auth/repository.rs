use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, SignInIdentity};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Insert or refresh the user keyed by (provider, subject). `fixed_id`
    /// is only used when the row is created.
    async fn upsert_user(&self, identity: &SignInIdentity, fixed_id: Option<Uuid>) -> Result<AuthUser, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<(String, String), AuthUser>>, // key: (provider, subject)
    }

    impl MockAuthRepository {
        pub fn len(&self) -> usize { self.users.lock().unwrap().len() }

        pub fn is_empty(&self) -> bool { self.len() == 0 }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn upsert_user(&self, identity: &SignInIdentity, fixed_id: Option<Uuid>) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            let key = (identity.provider.clone(), identity.subject.clone());
            let id = users.get(&key).map(|u| u.id).or(fixed_id).unwrap_or_else(Uuid::new_v4);
            let user = AuthUser { id, email: identity.email.clone(), name: identity.name.clone(), image: identity.image.clone() };
            users.insert(key, user.clone());
            Ok(user)
        }
    }
}
