#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use server::routes::{self, auth::ServerState};
use service::assets::AssetCleaner;
use service::auth::oauth::{GoogleEndpoints, GoogleOAuthClient};
use service::auth::repository::mock::MockAuthRepository;
use service::auth::{AuthService, AuthSettings, SessionIssuer};
use service::image_store::MockImageStore;
use service::mock::InMemoryStore;
use service::{CategoryService, MenuItemService, MenuService};

pub const SECRET: &str = "router-test-secret-0123456789abcdef";
pub const BYPASS: &str = "open-sesame";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub images: Arc<MockImageStore>,
    pub issuer: SessionIssuer,
}

pub fn app_with(settings: AuthSettings) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let images = Arc::new(MockImageStore::new());
    let cleaner = AssetCleaner::new(images.clone(), store.clone());
    let oauth = GoogleOAuthClient::new("client-id", "client-secret", GoogleEndpoints {
        authorize: "https://idp.test/authorize".into(),
        token: "https://idp.test/token".into(),
        userinfo: "https://idp.test/userinfo".into(),
    });
    let issuer = SessionIssuer::new(SECRET);
    let auth = AuthService::new(Arc::new(MockAuthRepository::default()), Arc::new(oauth), issuer.clone(), settings);
    let state = ServerState {
        auth: Arc::new(auth),
        menus: MenuService::new(store.clone(), cleaner.clone()),
        categories: CategoryService::new(store.clone(), images.clone(), cleaner.clone()),
        items: MenuItemService::new(store.clone(), images.clone(), cleaner),
        secure_cookies: false,
    };
    let router = routes::build_router(state, tower_http::cors::CorsLayer::very_permissive());
    TestApp { router, store, images, issuer }
}

pub fn app() -> TestApp {
    app_with(AuthSettings { bypass_key: Some(BYPASS.into()), ..Default::default() })
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Sign in through the bypass and return the bearer token.
    pub async fn sign_in(&self) -> String {
        let resp = self
            .send(json_request("POST", "/auth/callback/credentials", None, serde_json::json!({"key": BYPASS})))
            .await;
        assert_eq!(resp.status(), 200);
        body_json(resp).await["token"].as_str().unwrap().to_string()
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
