use serde::Deserialize;
use uuid::Uuid;

use crate::comments::repo::NewComment;
use crate::repository::patch::provided;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
    #[serde(default, alias = "published")]
    pub is_published: bool,
    #[serde(default)]
    pub post_id: Option<i64>,
}

impl CreateCommentRequest {
    pub fn into_new_comment(self, owner: Uuid) -> NewComment {
        NewComment {
            body: self.body,
            is_published: self.is_published,
            user_id: Some(owner),
            post_id: self.post_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentChanges {
    #[serde(default, deserialize_with = "provided")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "provided", alias = "published")]
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "provided")]
    pub user_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "provided")]
    pub post_id: Option<Option<i64>>,
}
