use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::domain::SignInIdentity;
use super::errors::AuthError;

/// Authorization-code OAuth provider.
#[async_trait]
pub trait OAuthClient: Send + Sync {
    fn provider(&self) -> &'static str;
    fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError>;
    /// Trade the callback `code` for the signed-in user's profile.
    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<SignInIdentity, AuthError>;
}

#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth".into(),
            token: "https://oauth2.googleapis.com/token".into(),
            userinfo: "https://openidconnect.googleapis.com/v1/userinfo".into(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

pub struct GoogleOAuthClient {
    http: Client,
    client_id: String,
    client_secret: String,
    endpoints: GoogleEndpoints,
}

impl GoogleOAuthClient {
    pub fn new(client_id: &str, client_secret: &str, endpoints: GoogleEndpoints) -> Self {
        Self { http: Client::new(), client_id: client_id.into(), client_secret: client_secret.into(), endpoints }
    }

    pub fn from_config(cfg: &configs::AuthConfig) -> Self {
        Self::new(&cfg.google_client_id, &cfg.google_client_secret, GoogleEndpoints::default())
    }
}

#[async_trait]
impl OAuthClient for GoogleOAuthClient {
    fn provider(&self) -> &'static str { "google" }

    fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.endpoints.authorize,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::OAuth(e.to_string()))?;
        Ok(url.into())
    }

    #[instrument(skip(self, code))]
    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<SignInIdentity, AuthError> {
        let resp = self
            .http
            .post(&self.endpoints.token)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthError::OAuth(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AuthError::OAuth(format!("token endpoint returned {}", resp.status())));
        }
        let token: TokenResponse = resp.json().await.map_err(|e| AuthError::OAuth(e.to_string()))?;

        let resp = self
            .http
            .get(&self.endpoints.userinfo)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AuthError::OAuth(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AuthError::OAuth(format!("userinfo endpoint returned {}", resp.status())));
        }
        let info: UserInfo = resp.json().await.map_err(|e| AuthError::OAuth(e.to_string()))?;
        debug!(sub = %info.sub, "oauth profile fetched");

        let name = info.name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| info.email.clone());
        Ok(SignInIdentity {
            provider: self.provider().to_string(),
            subject: info.sub,
            email: info.email,
            name,
            image: info.picture,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GoogleOAuthClient {
        GoogleOAuthClient::new("cid", "csecret", GoogleEndpoints {
            authorize: format!("{}/authorize", server.uri()),
            token: format!("{}/token", server.uri()),
            userinfo: format!("{}/userinfo", server.uri()),
        })
    }

    #[tokio::test]
    async fn authorize_url_carries_params() {
        let server = MockServer::start().await;
        let url = client(&server).authorize_url("https://app.example.com/auth/callback/google", "st8").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let q: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(q["client_id"], "cid");
        assert_eq!(q["state"], "st8");
        assert_eq!(q["response_type"], "code");
        assert_eq!(q["redirect_uri"], "https://app.example.com/auth/callback/google");
    }

    #[tokio::test]
    async fn exchange_fetches_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "at-1"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer at-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "g-42", "email": "chef@example.com", "name": "Chef", "picture": "https://pic"
            })))
            .mount(&server)
            .await;

        let id = client(&server).exchange("abc", "https://app/cb").await.unwrap();
        assert_eq!(id.provider, "google");
        assert_eq!(id.subject, "g-42");
        assert_eq!(id.name, "Chef");
        assert_eq!(id.image.as_deref(), Some("https://pic"));
    }

    #[tokio::test]
    async fn token_failure_is_oauth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        let err = client(&server).exchange("bad", "https://app/cb").await.unwrap_err();
        assert!(matches!(err, AuthError::OAuth(_)));
    }
}
