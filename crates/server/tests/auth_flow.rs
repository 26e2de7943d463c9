mod common;

use axum::http::header;
use chrono::{Duration, Utc};
use serde_json::json;

use common::{app, app_with, body_json, empty_request, json_request, BYPASS};
use service::auth::service::TEST_USER_ID;
use service::auth::AuthSettings;

#[tokio::test]
async fn health_and_metrics_are_public() {
    let t = app();
    let resp = t.send(empty_request("GET", "/health", None)).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp).await["status"], "ok");

    let resp = t.send(empty_request("GET", "/metrics", None)).await;
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn bypass_sign_in_sets_cookie_and_session_works() {
    let t = app();
    let resp = t.send(json_request("POST", "/auth/callback/credentials", None, json!({"key": BYPASS}))).await;
    assert_eq!(resp.status(), 200);
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(cookie.starts_with("session_token="));
    assert!(cookie.contains("HttpOnly"));

    let cookie_pair = cookie.split(';').next().unwrap().to_string();
    let req = axum::http::Request::builder()
        .uri("/auth/session")
        .header(header::COOKIE, cookie_pair)
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = t.send(req).await;
    assert_eq!(resp.status(), 200);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["id"], TEST_USER_ID.to_string());
    assert_eq!(body["user"]["email"], "test@example.com");
    assert_eq!(body["user"]["name"], "Test User");
    assert!(body["expires"].is_string());
}

#[tokio::test]
async fn wrong_bypass_key_is_401_and_disabled_is_404() {
    let t = app();
    let resp = t.send(json_request("POST", "/auth/callback/credentials", None, json!({"key": "nope"}))).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(body_json(resp).await["error"], "Unauthorized");

    let t = app_with(AuthSettings::default());
    let resp = t.send(json_request("POST", "/auth/callback/credentials", None, json!({"key": BYPASS}))).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn protected_routes_require_session() {
    let t = app();
    assert_eq!(t.send(empty_request("GET", "/api/menus", None)).await.status(), 401);
    assert_eq!(t.send(empty_request("GET", "/auth/session", Some("forged.token.value"))).await.status(), 401);
}

#[tokio::test]
async fn old_session_is_renewed_on_response() {
    let t = app();
    let issued = t
        .issuer
        .issue_at(TEST_USER_ID.to_string(), "Test User", "test@example.com", Utc::now() - Duration::hours(30))
        .unwrap();
    let resp = t.send(empty_request("GET", "/auth/session", Some(&issued.token))).await;
    assert_eq!(resp.status(), 200);
    let cookie = resp.headers().get(header::SET_COOKIE).expect("renewed cookie").to_str().unwrap();
    assert!(cookie.starts_with("session_token="));
    assert!(!cookie.contains(&issued.token));

    let fresh = t.issuer.issue_at(TEST_USER_ID.to_string(), "Test User", "test@example.com", Utc::now()).unwrap();
    let resp = t.send(empty_request("GET", "/auth/session", Some(&fresh.token))).await;
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn google_sign_in_redirects_with_state_cookie() {
    let t = app_with(AuthSettings { base_url: Some("https://menus.example.com".into()), ..Default::default() });
    let resp = t.send(empty_request("GET", "/auth/signin/google", None)).await;
    assert_eq!(resp.status(), 303);
    let location = resp.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with("https://idp.test/authorize?"));
    assert!(location.contains("redirect_uri=https%3A%2F%2Fmenus.example.com%2Fauth%2Fcallback%2Fgoogle"));
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("oauth_state="));
}

#[tokio::test]
async fn google_callback_without_state_cookie_is_rejected() {
    let t = app();
    let req = axum::http::Request::builder()
        .uri("/auth/callback/google?code=abc&state=xyz")
        .header(header::HOST, "localhost:8080")
        .body(axum::body::Body::empty())
        .unwrap();
    assert_eq!(t.send(req).await.status(), 400);
}

#[tokio::test]
async fn signout_clears_cookie() {
    let t = app();
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/auth/signout")
        .header(header::COOKIE, "session_token=abc")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = t.send(req).await;
    assert_eq!(resp.status(), 204);
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("session_token=;"));
    assert!(cookie.contains("Max-Age=0"));
}
