use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use keystead::{
    app::build_app,
    config::{AppConfig, AppEnv, JwtConfig},
    state::AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn make_app() -> (Router, AppState, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = AppConfig {
        env: AppEnv::Production,
        listen_addr: ([127, 0, 0, 1], 0).into(),
        database_url: format!("sqlite://{}", dir.path().join("users.db").display()),
        jwt: JwtConfig {
            secret: "integration-secret".into(),
            algorithm: "HS256".into(),
            ttl_minutes: 30,
        },
    };
    let state = AppState::init(config).await.expect("state");
    (build_app(state.clone()), state, dir)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
    let req = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn register_login_and_me() {
    let (app, state, _dir) = make_app().await;

    let (status, body) = post_json(
        &app,
        "/auth/register",
        json!({"email": "a@x.com", "password": "secret123", "full_name": "A"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(user, json!({"email": "a@x.com", "full_name": "A"}));

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({"email": "a@x.com", "password": "secret123"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tokens: Value = serde_json::from_slice(&body).unwrap();
    let token = tokens["access_token"].as_str().expect("token string");
    assert!(!token.is_empty());
    assert_eq!(token.matches('.').count(), 2);
    assert_eq!(tokens["token_type"], "bearer");
    assert_eq!(state.tokens.verify(token).unwrap()["sub"], "a@x.com");

    let req = Request::get("/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let me: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(me["email"], "a@x.com");
    assert!(me.get("hashed_password").is_none());
}

#[tokio::test]
async fn login_failures_look_the_same() {
    let (app, _state, _dir) = make_app().await;
    post_json(
        &app,
        "/auth/register",
        json!({"email": "a@x.com", "password": "secret123"}),
    )
    .await;

    let wrong = post_json(&app, "/auth/login", json!({"email": "a@x.com", "password": "wrong"})).await;
    let unknown = post_json(
        &app,
        "/auth/login",
        json!({"email": "ghost@x.com", "password": "secret123"}),
    )
    .await;
    assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, unknown);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (app, _state, _dir) = make_app().await;
    let body = json!({"email": "dup@x.com", "password": "pw"});

    let (first, _) = post_json(&app, "/auth/register", body.clone()).await;
    let (second, msg) = post_json(&app, "/auth/register", body).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(!String::from_utf8(msg).unwrap().contains("pw"));
}

#[tokio::test]
async fn expired_or_foreign_tokens_are_refused() {
    let (app, state, _dir) = make_app().await;
    let mut claims = serde_json::Map::new();
    claims.insert("sub".into(), json!("a@x.com"));
    let expired = state
        .tokens
        .issue(&claims, Some(time::Duration::seconds(-1)))
        .unwrap();

    for token in [expired.as_str(), "not.a.jwt"] {
        let req = Request::get("/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    let res = app
        .clone()
        .oneshot(Request::get("/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health() {
    let (app, _state, _dir) = make_app().await;
    let res = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
