#![allow(dead_code)]

use serde_json::{Value, json};
use std::sync::Arc;
use tokenwarden::api;
use tokenwarden::application_impl::*;
use tokenwarden::application_port::*;
use tokenwarden::domain_model::*;
use tokenwarden::domain_port::*;
use tokenwarden::infra_memory::*;
use tokenwarden::server::Server;
use warp::http::StatusCode;
use warp::test::RequestBuilder;

pub const ACCESS_SECRET: &[u8] = b"it-access-secret";
pub const REFRESH_SECRET: &[u8] = b"it-refresh-secret";

pub struct TestApp {
    pub server: Arc<Server>,
    pub cache: Arc<MemoryRevocationCache>,
}

pub fn codec() -> JwtHs256Codec {
    JwtHs256Codec::new(JwtConfig {
        access_secret: ACCESS_SECRET.to_vec(),
        refresh_secret: REFRESH_SECRET.to_vec(),
    })
}

pub fn server_with_cache(revocation_cache: Arc<dyn RevocationCache>) -> Arc<Server> {
    let credential_store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new(
        Arc::new(Argon2PasswordHasher::insecure_fast()),
    ));
    let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
        credential_store.clone(),
        Arc::new(codec()),
        revocation_cache,
        TokenLifetimes {
            access: chrono::Duration::minutes(1),
            refresh: chrono::Duration::days(1),
        },
    ));
    let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(credential_store));
    Arc::new(Server::new(auth_service, user_service))
}

pub fn test_app() -> TestApp {
    let cache = Arc::new(MemoryRevocationCache::new());
    TestApp {
        server: server_with_cache(cache.clone()),
        cache,
    }
}

pub async fn send(server: &Arc<Server>, request: RequestBuilder) -> (StatusCode, Value) {
    let filter = api::routes(server.clone());
    let response = request.reply(&filter).await;
    let body: Value = serde_json::from_slice(response.body()).unwrap_or(Value::Null);
    (response.status(), body)
}

pub async fn create_user(server: &Arc<Server>, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        server,
        warp::test::request()
            .method("POST")
            .path("/api/v1/create-user")
            .json(&json!({ "email": email, "password": password })),
    )
    .await
}

pub async fn login(server: &Arc<Server>, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        server,
        warp::test::request()
            .method("POST")
            .path("/api/v1/login")
            .json(&json!({ "email": email, "password": password })),
    )
    .await
}

pub async fn refresh(server: &Arc<Server>, refresh_token: &str) -> (StatusCode, Value) {
    send(
        server,
        warp::test::request()
            .method("POST")
            .path("/api/v1/refresh-token")
            .header("refreshtoken", refresh_token),
    )
    .await
}

pub async fn logout(server: &Arc<Server>, refresh_token: &str) -> (StatusCode, Value) {
    send(
        server,
        warp::test::request()
            .method("DELETE")
            .path("/api/v1/logout")
            .header("refreshtoken", refresh_token),
    )
    .await
}

pub async fn me(server: &Arc<Server>, authorization: &str) -> (StatusCode, Value) {
    send(
        server,
        warp::test::request()
            .method("GET")
            .path("/api/v1/me")
            .header("authorization", authorization),
    )
    .await
}

/// Creates the user and logs in, returning `(user_id, access, refresh)`.
pub async fn signed_in(server: &Arc<Server>, email: &str) -> (UserId, String, String) {
    let (status, _) = create_user(server, email, "password1").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = login(server, email, "password1").await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let data = &body["data"];
    let user_id: UserId = data["user_id"].as_str().unwrap().parse().unwrap();
    (
        user_id,
        data["access_token"].as_str().unwrap().to_string(),
        data["refresh_token"].as_str().unwrap().to_string(),
    )
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}
