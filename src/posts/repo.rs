use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::posts::dto::PostChanges;
use crate::repository::{Merge, Record, Repository};

pub type PostRepository = Repository<Post>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub is_published: bool,
    pub user_id: Option<Uuid>, // owner, null when unowned
}

/// Insert payload; the store assigns the identity.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub is_published: bool,
    pub user_id: Option<Uuid>,
}

#[async_trait]
impl Record for Post {
    type Id = i64;

    const KIND: &'static str = "Post";
    const TABLE: &'static str = "post";
    const COLUMNS: &'static str = "id, title, body, is_published, user_id";

    async fn save(&self, id: i64, conn: &mut SqliteConnection) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE post
               SET title = ?1, body = ?2, is_published = ?3, user_id = ?4
             WHERE id = ?5
            RETURNING id, title, body, is_published, user_id
            "#,
        )
        .bind(self.title.as_str())
        .bind(self.body.as_str())
        .bind(self.is_published)
        .bind(self.user_id)
        .bind(id)
        .fetch_one(conn)
        .await
    }
}

impl Merge<Post> for PostChanges {
    fn merge_into(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(body) = self.body {
            post.body = body;
        }
        if let Some(is_published) = self.is_published {
            post.is_published = is_published;
        }
        if let Some(user_id) = self.user_id {
            post.user_id = user_id;
        }
    }
}

impl Repository<Post> {
    pub async fn create(&self, new: NewPost) -> anyhow::Result<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO post (title, body, is_published, user_id)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, title, body, is_published, user_id
            "#,
        )
        .bind(new.title)
        .bind(new.body)
        .bind(new.is_published)
        .bind(new.user_id)
        .fetch_one(self.pool())
        .await
        .context("insert post")?;
        Ok(post)
    }
}
