use std::sync::Arc;

use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use service::auth::AuthService;
use service::{CategoryService, MenuItemService, MenuService};

use crate::errors::JsonApiError;
use crate::metrics::record_sign_in;

pub const SESSION_COOKIE: &str = "session_token";
pub const STATE_COOKIE: &str = "oauth_state";

/// Shared application state; immutable after startup.
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    pub menus: MenuService,
    pub categories: CategoryService,
    pub items: MenuItemService,
    pub secure_cookies: bool,
}

/// Caller identity injected by [`require_session`].
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionUserBody {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub user: SessionUserBody,
    pub expires: DateTime<Utc>,
    /// Only present right after sign-in, for clients that send a bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CredentialsRequest {
    pub key: String,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

fn state_cookie(state: String, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, state))
        .path("/auth")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Bearer header first, then the session cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(authz) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return authz.strip_prefix("Bearer ").map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

#[utoipa::path(get, path = "/auth/signin/google", tag = "auth", responses((status = 303, description = "Redirect to provider")))]
pub async fn signin_google(State(state): State<ServerState>, headers: HeaderMap, jar: CookieJar) -> Result<(CookieJar, Redirect), JsonApiError> {
    let start = state.auth.begin_oauth(&headers)?;
    debug!(provider = state.auth.provider(), "oauth sign-in started");
    let jar = jar.add(state_cookie(start.state, state.secure_cookies));
    Ok((jar, Redirect::to(&start.authorize_url)))
}

#[utoipa::path(get, path = "/auth/callback/google", tag = "auth", params(CallbackQuery), responses((status = 303, description = "Signed in"), (status = 400, description = "State mismatch"), (status = 502, description = "Provider error")))]
pub async fn callback_google(
    State(state): State<ServerState>,
    headers: HeaderMap,
    jar: CookieJar,
    Query(q): Query<CallbackQuery>,
) -> Result<(CookieJar, Redirect), JsonApiError> {
    if let Some(err) = q.error {
        record_sign_in("google", false);
        return Err(JsonApiError::new(StatusCode::UNAUTHORIZED, "Sign-in Cancelled", Some(err)));
    }
    let (Some(code), Some(returned_state)) = (q.code, q.state) else {
        return Err(JsonApiError::new(StatusCode::BAD_REQUEST, "Bad Request", Some("code and state are required".into())));
    };
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let session = match state.auth.complete_oauth(&headers, &code, &returned_state, expected.as_deref()).await {
        Ok(s) => s,
        Err(e) => {
            record_sign_in("google", false);
            return Err(e.into());
        }
    };
    record_sign_in("google", true);
    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path("/auth"))
        .add(session_cookie(session.token, state.secure_cookies));
    Ok((jar, Redirect::to("/")))
}

#[utoipa::path(post, path = "/auth/callback/credentials", tag = "auth", request_body = CredentialsRequest, responses((status = 200, description = "Signed in", body = SessionResponse), (status = 401, description = "Unauthorized"), (status = 404, description = "Bypass disabled")))]
pub async fn callback_credentials(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(input): Json<CredentialsRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), JsonApiError> {
    let session = match state.auth.sign_in_with_bypass(&input.key).await {
        Ok(s) => s,
        Err(e) => {
            record_sign_in("credentials", false);
            return Err(e.into());
        }
    };
    record_sign_in("credentials", true);
    info!(user_id = %session.user.id, "bypass session issued");
    let body = SessionResponse {
        user: SessionUserBody { id: session.user.id, name: session.user.name, email: session.user.email },
        expires: session.expires,
        token: Some(session.token.clone()),
    };
    Ok((jar.add(session_cookie(session.token, state.secure_cookies)), Json(body)))
}

#[utoipa::path(get, path = "/auth/session", tag = "auth", responses((status = 200, description = "Current session", body = SessionResponse), (status = 401, description = "Unauthorized")))]
pub async fn session(Extension(user): Extension<SessionUser>) -> Json<SessionResponse> {
    Json(SessionResponse {
        user: SessionUserBody { id: user.id, name: user.name, email: user.email },
        expires: user.expires,
        token: None,
    })
}

#[utoipa::path(post, path = "/auth/signout", tag = "auth", responses((status = 204, description = "Signed out")))]
pub async fn signout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

/// 会话中间件：校验 Bearer 或 session_token Cookie，注入 SessionUser；
/// 令牌签发超过 24 小时则在响应中续期 Cookie
pub async fn require_session(State(state): State<ServerState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let Some(token) = extract_token(req.headers()) else {
        debug!(path = %path, "missing session token");
        return JsonApiError::unauthorized().into_response();
    };
    let sessions = state.auth.sessions();
    let claims = match sessions.verify(&token) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path, err = %e, "session validation failed");
            return JsonApiError::unauthorized().into_response();
        }
    };
    let Ok(user_id) = claims.user_id() else {
        return JsonApiError::unauthorized().into_response();
    };

    let now = Utc::now();
    let renewed = if sessions.needs_renewal(&claims, now) {
        match sessions.renew(&claims, now) {
            Ok(r) => Some(r),
            Err(e) => {
                warn!(err = %e, "session renewal failed");
                None
            }
        }
    } else {
        None
    };
    let expires = renewed.as_ref().map(|r| r.claims.expires()).unwrap_or_else(|| claims.expires());

    req.extensions_mut().insert(SessionUser { id: user_id, name: claims.name, email: claims.email, expires });
    let mut resp = next.run(req).await;

    if let Some(r) = renewed {
        let cookie = session_cookie(r.token, state.secure_cookies);
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(v) => {
                resp.headers_mut().append(header::SET_COOKIE, v);
                debug!(user_id = %user_id, "session renewed");
            }
            Err(e) => warn!(err = %e, "renewed cookie not encodable"),
        }
    }
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_from_bearer_then_cookie() {
        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_static("session_token=from-cookie; other=1"));
        assert_eq!(extract_token(&h).as_deref(), Some("from-cookie"));

        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&h).as_deref(), Some("from-header"));

        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&h), None);
    }
}
