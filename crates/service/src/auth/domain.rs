use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain user (business view)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

/// Identity returned by a sign-in strategy, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInIdentity {
    pub provider: String,
    pub subject: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

/// Sign-in result: the user and a freshly issued session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub token: String,
    pub expires: DateTime<Utc>,
}

/// Where to send the browser to start an OAuth sign-in, and the `state`
/// the callback must echo back.
#[derive(Debug, Clone)]
pub struct OAuthStart {
    pub authorize_url: String,
    pub state: String,
}
