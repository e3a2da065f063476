mod common;

use axum::http::{header::LOCATION, StatusCode};
use blog_api::{auth::repo::User, comments::repo::Comment};
use serde_json::{json, Value};
use uuid::Uuid;

use common::{bearer, server, signed_in};

#[tokio::test]
async fn comment_lifecycle_on_a_post() {
    let (server, _) = server().await;
    let token = signed_in(&server, "reader@example.com").await;
    let (name, value) = bearer(&token);

    server
        .post("/api/v1/posts")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "title": "T", "body": "B", "published": true }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/v1/comments")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "body": "nice", "post_id": 1 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.header(LOCATION), "/api/v1/comments/1");
    let comment: Comment = response.json();
    assert_eq!(comment.id, 1);
    assert_eq!(comment.post_id, Some(1));
    assert!(!comment.is_published);

    let listed = server.get("/api/v1/posts/1/comments").await;
    listed.assert_status_ok();
    assert_eq!(listed.json::<Vec<Comment>>(), vec![comment.clone()]);

    let updated = server
        .put("/api/v1/comments/1")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "published": true }))
        .await;
    updated.assert_status_ok();
    let updated: Comment = updated.json();
    assert!(updated.is_published);
    assert_eq!(updated.body, "nice");

    server
        .delete("/api/v1/comments/1")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let gone = server.get("/api/v1/comments/1").await;
    gone.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(gone.json::<Value>(), json!({ "detail": "Comment not found" }));
}

#[tokio::test]
async fn deleting_a_post_detaches_its_comments() {
    let (server, _) = server().await;
    let token = signed_in(&server, "detach@example.com").await;
    let (name, value) = bearer(&token);

    server
        .post("/api/v1/posts")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "title": "T", "body": "B", "published": true }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/v1/comments")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "body": "c", "post_id": 1 }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .delete("/api/v1/posts/1")
        .add_header(name, value)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let comment: Comment = server.get("/api/v1/comments/1").await.json();
    assert_eq!(comment.post_id, None);

    server
        .get("/api/v1/posts/1/comments")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn null_post_id_clears_the_link() {
    let (server, _) = server().await;
    let token = signed_in(&server, "clear@example.com").await;
    let (name, value) = bearer(&token);

    server
        .post("/api/v1/posts")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "title": "T", "body": "B", "published": true }))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/api/v1/comments")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "body": "c", "post_id": 1 }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .put("/api/v1/comments/1")
        .add_header(name, value)
        .json(&json!({ "post_id": null }))
        .await;
    response.assert_status_ok();
    let comment: Comment = response.json();
    assert_eq!(comment.post_id, None);
    assert_eq!(comment.body, "c");
}

#[tokio::test]
async fn comment_on_unknown_post_is_not_stored() {
    let (server, _) = server().await;
    let token = signed_in(&server, "orphan@example.com").await;
    let (name, value) = bearer(&token);

    let response = server
        .post("/api/v1/comments")
        .add_header(name, value)
        .json(&json!({ "body": "c", "post_id": 77 }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.json::<Value>(),
        json!({ "detail": "Referenced record does not exist" })
    );

    let listed: Vec<Comment> = server.get("/api/v1/comments").await.json();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn comment_writes_require_authentication() {
    let (server, _) = server().await;
    server
        .post("/api/v1/comments")
        .json(&json!({ "body": "c" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .delete("/api/v1/comments/1")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_ignores_client_identity_and_owner() {
    let (server, state) = server().await;
    let token = signed_in(&server, "commenter@example.com").await;
    let (name, value) = bearer(&token);
    let caller = User::find_by_email(&state.db, "commenter@example.com")
        .await
        .unwrap()
        .expect("caller registered");

    let response = server
        .post("/api/v1/comments")
        .add_header(name, value)
        .json(&json!({ "id": 99, "user_id": Uuid::new_v4(), "body": "hi" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let comment: Comment = response.json();
    assert_eq!(comment.id, 1);
    assert_eq!(comment.user_id, Some(caller.id));
    assert_eq!(comment.post_id, None);

    server
        .get("/api/v1/comments/99")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_update_checks_authentication_first() {
    let (server, _) = server().await;
    server
        .put("/api/v1/comments/abc")
        .json(&json!({ "body": "x" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
