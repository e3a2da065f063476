use serde::Deserialize;
use uuid::Uuid;

use crate::posts::repo::NewPost;
use crate::repository::patch::provided;

/// Request body for creating a post. Unknown keys such as `id` or
/// `user_id` are ignored; the owner is the authenticated caller.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    #[serde(alias = "published")]
    pub is_published: bool,
}

impl CreatePostRequest {
    pub fn into_new_post(self, owner: Uuid) -> NewPost {
        NewPost {
            title: self.title,
            body: self.body,
            is_published: self.is_published,
            user_id: Some(owner),
        }
    }
}

/// Partial update for a post; `None` leaves the column untouched.
#[derive(Debug, Default, Deserialize)]
pub struct PostChanges {
    #[serde(default, deserialize_with = "provided")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "provided")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "provided", alias = "published")]
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "provided")]
    pub user_id: Option<Option<Uuid>>,
}
