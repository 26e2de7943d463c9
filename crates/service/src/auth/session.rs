//! Stateless sessions: HS256 JWTs with a 30 day lifetime and sliding renewal
//! once a day.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::AuthError;

pub const SESSION_MAX_AGE_DAYS: i64 = 30;
pub const RENEW_AFTER_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id.
    pub sub: String,
    pub name: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|e| AuthError::TokenError(format!("bad subject: {e}")))
    }

    pub fn expires(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionIssuer {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user: &AuthUser) -> Result<IssuedSession, AuthError> {
        self.issue_at(user.id.to_string(), &user.name, &user.email, Utc::now())
    }

    pub fn issue_at(&self, sub: String, name: &str, email: &str, now: DateTime<Utc>) -> Result<IssuedSession, AuthError> {
        let claims = SessionClaims {
            sub,
            name: name.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::days(SESSION_MAX_AGE_DAYS)).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(IssuedSession { token, claims })
    }

    /// Signature and expiry check.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::Unauthorized)
    }

    pub fn needs_renewal(&self, claims: &SessionClaims, now: DateTime<Utc>) -> bool {
        now.timestamp() - claims.iat >= Duration::hours(RENEW_AFTER_HOURS).num_seconds()
    }

    /// Same identity, fresh `iat`/`exp`.
    pub fn renew(&self, claims: &SessionClaims, now: DateTime<Utc>) -> Result<IssuedSession, AuthError> {
        self.issue_at(claims.sub.clone(), &claims.name, &claims.email, now)
    }
}
