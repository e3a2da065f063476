use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::CurrentUser,
    comments::repo::{Comment, CommentRepository},
    error::ApiError,
    extract::{IdPath, JsonBody},
    posts::{
        dto::{CreatePostRequest, PostChanges},
        repo::{Post, PostRepository},
    },
    state::AppState,
};

const NOT_FOUND: ApiError = ApiError::NotFound("Post");

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(find_post).put(update_post).delete(delete_post),
        )
        .route("/posts/:id/comments", get(list_post_comments))
}

#[instrument(skip(repo))]
pub async fn list_posts(State(repo): State<PostRepository>) -> Result<Json<Vec<Post>>, ApiError> {
    Ok(Json(repo.list_all().await?))
}

#[instrument(skip(repo))]
pub async fn find_post(
    State(repo): State<PostRepository>,
    IdPath(id): IdPath,
) -> Result<Json<Post>, ApiError> {
    repo.find(id).await?.map(Json).ok_or(NOT_FOUND)
}

#[instrument(skip(repo, user, payload))]
pub async fn create_post(
    State(repo): State<PostRepository>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = repo.create(payload.into_new_post(user.id)).await?;
    info!(post_id = post.id, user_id = %user.id, "post created");
    let location = format!("/api/v1/posts/{}", post.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(post)))
}

#[instrument(skip(repo, user, changes))]
pub async fn update_post(
    State(repo): State<PostRepository>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
    JsonBody(changes): JsonBody<PostChanges>,
) -> Result<Json<Post>, ApiError> {
    let post = repo.update(id, changes).await?.ok_or(NOT_FOUND)?;
    info!(post_id = post.id, user_id = %user.id, "post updated");
    Ok(Json(post))
}

#[instrument(skip(repo, user))]
pub async fn delete_post(
    State(repo): State<PostRepository>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    if !repo.delete(id).await? {
        return Err(NOT_FOUND);
    }
    info!(post_id = id, user_id = %user.id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(posts, comments))]
pub async fn list_post_comments(
    State(posts): State<PostRepository>,
    State(comments): State<CommentRepository>,
    IdPath(id): IdPath,
) -> Result<Json<Vec<Comment>>, ApiError> {
    if posts.find(id).await?.is_none() {
        return Err(NOT_FOUND);
    }
    Ok(Json(comments.list_by_post(id).await?))
}
