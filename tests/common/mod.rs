#![allow(dead_code)]

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum_test::TestServer;
use blog_api::{app::build_app, auth::dto::TokenResponse, state::AppState};
use serde_json::json;

pub const PASSWORD: &str = "correct-horse-battery";

pub async fn server() -> (TestServer, AppState) {
    let state = AppState::ephemeral().await.expect("in-memory state");
    let server = TestServer::new(build_app(state.clone())).expect("test server");
    (server, state)
}

pub async fn register(server: &TestServer, email: &str) {
    server
        .post("/auth/register")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await
        .assert_status(axum::http::StatusCode::CREATED);
}

pub async fn login(server: &TestServer, email: &str) -> TokenResponse {
    let response = server
        .post("/auth/login")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await;
    response.assert_status_ok();
    response.json::<TokenResponse>()
}

/// Register a fresh account and return its access token.
pub async fn signed_in(server: &TestServer, email: &str) -> String {
    register(server, email).await;
    login(server, email).await.access_token
}

pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("header value");
    (AUTHORIZATION, value)
}
