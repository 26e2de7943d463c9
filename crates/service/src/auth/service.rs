use std::sync::Arc;

use axum::http::HeaderMap;
use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::base_url::{host_fallback, resolve_base_url};
use super::domain::{AuthSession, AuthUser, OAuthStart, SignInIdentity};
use super::errors::AuthError;
use super::oauth::OAuthClient;
use super::repository::AuthRepository;
use super::session::SessionIssuer;

/// Fixed identity behind the test bypass.
pub const TEST_USER_ID: Uuid = Uuid::from_u128(0x7e57_0000_0000_4000_8000_0000_0000_0001);
pub const TEST_USER_EMAIL: &str = "test@example.com";
pub const TEST_USER_NAME: &str = "Test User";

/// Auth service configuration
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub bypass_key: Option<String>,
    pub base_url: Option<String>,
    pub platform_url: Option<String>,
}

impl From<&configs::AuthConfig> for AuthSettings {
    fn from(cfg: &configs::AuthConfig) -> Self {
        Self {
            bypass_key: cfg.test_bypass_key.clone().filter(|k| !k.is_empty()),
            base_url: cfg.base_url.clone(),
            platform_url: cfg.platform_url.clone(),
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Auth business service independent of web framework
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    oauth: Arc<dyn OAuthClient>,
    sessions: SessionIssuer,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, oauth: Arc<dyn OAuthClient>, sessions: SessionIssuer, settings: AuthSettings) -> Self {
        Self { repo, oauth, sessions, settings }
    }

    pub fn sessions(&self) -> &SessionIssuer { &self.sessions }

    pub fn provider(&self) -> &'static str { self.oauth.provider() }

    pub fn bypass_enabled(&self) -> bool { self.settings.bypass_key.is_some() }

    /// `{base}/auth/callback/{provider}` for this request.
    pub fn redirect_uri(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let base = resolve_base_url(self.settings.base_url.as_deref(), headers, self.settings.platform_url.as_deref())
            .or_else(|| host_fallback(headers))
            .ok_or_else(|| AuthError::Validation("cannot determine public base url".into()))?;
        Ok(format!("{}/auth/callback/{}", base, self.oauth.provider()))
    }

    pub fn begin_oauth(&self, headers: &HeaderMap) -> Result<OAuthStart, AuthError> {
        let state: String = rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
        let redirect = self.redirect_uri(headers)?;
        let authorize_url = self.oauth.authorize_url(&redirect, &state)?;
        Ok(OAuthStart { authorize_url, state })
    }

    /// Validate the echoed `state`, exchange the code and open a session.
    #[instrument(skip(self, headers, code, state, expected_state))]
    pub async fn complete_oauth(
        &self,
        headers: &HeaderMap,
        code: &str,
        state: &str,
        expected_state: Option<&str>,
    ) -> Result<AuthSession, AuthError> {
        let Some(expected) = expected_state else { return Err(AuthError::InvalidState) };
        if !constant_time_eq(state.as_bytes(), expected.as_bytes()) {
            warn!("oauth state mismatch");
            return Err(AuthError::InvalidState);
        }
        let redirect = self.redirect_uri(headers)?;
        let identity = self.oauth.exchange(code, &redirect).await?;
        let user = self.repo.upsert_user(&identity, None).await?;
        info!(user_id = %user.id, provider = %identity.provider, "user_signed_in");
        self.open_session(user)
    }

    /// Sign in as the fixed test user when `key` matches the configured one.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthSettings, SessionIssuer};
    /// use service::auth::oauth::GoogleOAuthClient;
    /// use service::auth::repository::mock::MockAuthRepository;
    /// use std::sync::Arc;
    /// let svc = AuthService::new(
    ///     Arc::new(MockAuthRepository::default()),
    ///     Arc::new(GoogleOAuthClient::new("id", "secret", Default::default())),
    ///     SessionIssuer::new("0123456789abcdef0123456789abcdef"),
    ///     AuthSettings { bypass_key: Some("k".into()), ..Default::default() },
    /// );
    /// let session = tokio_test::block_on(svc.sign_in_with_bypass("k")).unwrap();
    /// assert_eq!(session.user.email, "test@example.com");
    /// ```
    #[instrument(skip(self, key))]
    pub async fn sign_in_with_bypass(&self, key: &str) -> Result<AuthSession, AuthError> {
        let Some(expected) = self.settings.bypass_key.as_deref() else { return Err(AuthError::Disabled) };
        if !constant_time_eq(key.as_bytes(), expected.as_bytes()) {
            warn!("bypass key rejected");
            return Err(AuthError::Unauthorized);
        }
        let identity = SignInIdentity {
            provider: "credentials".into(),
            subject: "test-user".into(),
            email: TEST_USER_EMAIL.into(),
            name: TEST_USER_NAME.into(),
            image: None,
        };
        let user = self.repo.upsert_user(&identity, Some(TEST_USER_ID)).await?;
        info!(user_id = %user.id, "test_user_signed_in");
        self.open_session(user)
    }

    fn open_session(&self, user: AuthUser) -> Result<AuthSession, AuthError> {
        let issued = self.sessions.issue(&user)?;
        let expires = issued.claims.expires();
        Ok(AuthSession { user, token: issued.token, expires })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;
    use async_trait::async_trait;
    use axum::http::HeaderValue;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    struct FakeProvider;

    #[async_trait]
    impl OAuthClient for FakeProvider {
        fn provider(&self) -> &'static str { "google" }

        fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError> {
            Ok(format!("https://idp/authorize?redirect_uri={redirect_uri}&state={state}"))
        }

        async fn exchange(&self, code: &str, _redirect_uri: &str) -> Result<SignInIdentity, AuthError> {
            if code != "good" {
                return Err(AuthError::OAuth("bad code".into()));
            }
            Ok(SignInIdentity {
                provider: "google".into(),
                subject: "g-1".into(),
                email: "chef@example.com".into(),
                name: "Chef".into(),
                image: None,
            })
        }
    }

    fn service(settings: AuthSettings) -> (Arc<MockAuthRepository>, AuthService) {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = AuthService::new(repo.clone(), Arc::new(FakeProvider), SessionIssuer::new(SECRET), settings);
        (repo, svc)
    }

    fn bypass(key: &str) -> AuthSettings {
        AuthSettings { bypass_key: Some(key.into()), ..Default::default() }
    }

    #[tokio::test]
    async fn bypass_accepts_exact_key() {
        let (repo, svc) = service(bypass("letmein"));
        let s = svc.sign_in_with_bypass("letmein").await.unwrap();
        assert_eq!(s.user.id, TEST_USER_ID);
        assert_eq!(s.user.name, TEST_USER_NAME);
        let claims = svc.sessions().verify(&s.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), TEST_USER_ID);

        svc.sign_in_with_bypass("letmein").await.unwrap();
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn bypass_rejects_wrong_key_and_when_disabled() {
        let (_, svc) = service(bypass("letmein"));
        assert!(matches!(svc.sign_in_with_bypass("letmeout").await, Err(AuthError::Unauthorized)));
        assert!(matches!(svc.sign_in_with_bypass("").await, Err(AuthError::Unauthorized)));

        let (repo, svc) = service(AuthSettings::default());
        assert!(!svc.bypass_enabled());
        assert!(matches!(svc.sign_in_with_bypass("anything").await, Err(AuthError::Disabled)));
        assert!(repo.is_empty());
    }

    #[test]
    fn redirect_uri_follows_resolution_order() {
        let (_, svc) = service(AuthSettings { platform_url: Some("https://platform.app".into()), ..Default::default() });
        let mut h = HeaderMap::new();
        h.insert("host", HeaderValue::from_static("localhost:3000"));
        assert_eq!(svc.redirect_uri(&h).unwrap(), "https://platform.app/auth/callback/google");

        let (_, svc) = service(AuthSettings::default());
        assert_eq!(svc.redirect_uri(&h).unwrap(), "http://localhost:3000/auth/callback/google");
        assert!(svc.redirect_uri(&HeaderMap::new()).is_err());
    }

    #[tokio::test]
    async fn oauth_round_trip() {
        let (_, svc) = service(AuthSettings { base_url: Some("https://menus.app".into()), ..Default::default() });
        let h = HeaderMap::new();
        let start = svc.begin_oauth(&h).unwrap();
        assert_eq!(start.state.len(), 32);
        assert!(start.authorize_url.contains("https://menus.app/auth/callback/google"));

        let s = svc.complete_oauth(&h, "good", &start.state, Some(&start.state)).await.unwrap();
        assert_eq!(s.user.email, "chef@example.com");

        let err = svc.complete_oauth(&h, "good", "forged", Some(&start.state)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidState));
        let err = svc.complete_oauth(&h, "good", &start.state, None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidState));
        let err = svc.complete_oauth(&h, "bad", &start.state, Some(&start.state)).await.unwrap_err();
        assert!(matches!(err, AuthError::OAuth(_)));
    }
}
