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
    comments::{
        dto::{CommentChanges, CreateCommentRequest},
        repo::{Comment, CommentRepository},
    },
    error::ApiError,
    extract::{IdPath, JsonBody},
    state::AppState,
};

const NOT_FOUND: ApiError = ApiError::NotFound("Comment");

pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/comments", get(list_comments).post(create_comment))
        .route(
            "/comments/:id",
            get(find_comment).put(update_comment).delete(delete_comment),
        )
}

#[instrument(skip(repo))]
pub async fn list_comments(
    State(repo): State<CommentRepository>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    Ok(Json(repo.list_all().await?))
}

#[instrument(skip(repo))]
pub async fn find_comment(
    State(repo): State<CommentRepository>,
    IdPath(id): IdPath,
) -> Result<Json<Comment>, ApiError> {
    repo.find(id).await?.map(Json).ok_or(NOT_FOUND)
}

#[instrument(skip(repo, user, payload))]
pub async fn create_comment(
    State(repo): State<CommentRepository>,
    CurrentUser(user): CurrentUser,
    JsonBody(payload): JsonBody<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = repo.create(payload.into_new_comment(user.id)).await?;
    info!(comment_id = comment.id, post_id = ?comment.post_id, user_id = %user.id, "comment created");
    let location = format!("/api/v1/comments/{}", comment.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(comment)))
}

#[instrument(skip(repo, user, changes))]
pub async fn update_comment(
    State(repo): State<CommentRepository>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
    JsonBody(changes): JsonBody<CommentChanges>,
) -> Result<Json<Comment>, ApiError> {
    let comment = repo.update(id, changes).await?.ok_or(NOT_FOUND)?;
    info!(comment_id = comment.id, user_id = %user.id, "comment updated");
    Ok(Json(comment))
}

#[instrument(skip(repo, user))]
pub async fn delete_comment(
    State(repo): State<CommentRepository>,
    CurrentUser(user): CurrentUser,
    IdPath(id): IdPath,
) -> Result<StatusCode, ApiError> {
    if !repo.delete(id).await? {
        return Err(NOT_FOUND);
    }
    info!(comment_id = id, user_id = %user.id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
