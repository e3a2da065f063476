use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use crate::comments::dto::CommentChanges;
use crate::repository::{Merge, Record, Repository};

pub type CommentRepository = Repository<Comment>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub body: String,
    pub is_published: bool,
    pub user_id: Option<Uuid>,
    pub post_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub body: String,
    pub is_published: bool,
    pub user_id: Option<Uuid>,
    pub post_id: Option<i64>,
}

#[async_trait]
impl Record for Comment {
    type Id = i64;

    const KIND: &'static str = "Comment";
    const TABLE: &'static str = "comment";
    const COLUMNS: &'static str = "id, body, is_published, user_id, post_id";

    async fn save(&self, id: i64, conn: &mut SqliteConnection) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comment
               SET body = ?1, is_published = ?2, user_id = ?3, post_id = ?4
             WHERE id = ?5
            RETURNING id, body, is_published, user_id, post_id
            "#,
        )
        .bind(self.body.as_str())
        .bind(self.is_published)
        .bind(self.user_id)
        .bind(self.post_id)
        .bind(id)
        .fetch_one(conn)
        .await
    }
}

impl Merge<Comment> for CommentChanges {
    fn merge_into(self, comment: &mut Comment) {
        if let Some(body) = self.body {
            comment.body = body;
        }
        if let Some(is_published) = self.is_published {
            comment.is_published = is_published;
        }
        if let Some(user_id) = self.user_id {
            comment.user_id = user_id;
        }
        if let Some(post_id) = self.post_id {
            comment.post_id = post_id;
        }
    }
}

impl Repository<Comment> {
    pub async fn create(&self, new: NewComment) -> anyhow::Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comment (body, is_published, user_id, post_id)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, body, is_published, user_id, post_id
            "#,
        )
        .bind(new.body)
        .bind(new.is_published)
        .bind(new.user_id)
        .bind(new.post_id)
        .fetch_one(self.pool())
        .await
        .context("insert comment")?;
        Ok(comment)
    }

    /// Comments attached to `post_id`, oldest first.
    pub async fn list_by_post(&self, post_id: i64) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, body, is_published, user_id, post_id
              FROM comment
             WHERE post_id = ?1
             ORDER BY id
            "#,
        )
        .bind(post_id)
        .fetch_all(self.pool())
        .await
        .context("list comments by post")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::posts::repo::{NewPost, PostRepository};

    async fn repos() -> (CommentRepository, PostRepository) {
        let pool = db::connect_in_memory().await.expect("in-memory db");
        (CommentRepository::new(pool.clone()), PostRepository::new(pool))
    }

    fn comment(body: &str, post_id: Option<i64>) -> NewComment {
        NewComment {
            body: body.into(),
            is_published: false,
            user_id: None,
            post_id,
        }
    }

    async fn seed_post(posts: &PostRepository) -> i64 {
        posts
            .create(NewPost {
                title: "Parent".into(),
                body: "Post body".into(),
                is_published: true,
                user_id: None,
            })
            .await
            .expect("create post")
            .id
    }

    #[tokio::test]
    async fn create_and_find_comment() {
        let (comments, _) = repos().await;
        let created = comments.create(comment("Test comment content", None)).await.unwrap();
        assert!(created.id > 0);
        assert!(!created.is_published);

        let found = comments.find(created.id).await.unwrap().unwrap();
        assert_eq!(found.body, "Test comment content");
    }

    #[tokio::test]
    async fn update_keeps_omitted_fields() {
        let (comments, posts) = repos().await;
        let post_id = seed_post(&posts).await;
        let created = comments.create(comment("Original", Some(post_id))).await.unwrap();

        let changes = CommentChanges {
            is_published: Some(true),
            ..Default::default()
        };
        let updated = comments.update(created.id, changes).await.unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.body, "Original");
        assert!(updated.is_published);
        assert_eq!(updated.post_id, Some(post_id));
    }

    #[tokio::test]
    async fn update_and_delete_missing_comment() {
        let (comments, _) = repos().await;
        let changes = CommentChanges {
            body: Some("nope".into()),
            ..Default::default()
        };
        assert!(comments.update(999, changes).await.unwrap().is_none());
        assert!(!comments.delete(999).await.unwrap());
        assert!(comments.find(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_by_post_filters_on_parent() {
        let (comments, posts) = repos().await;
        let post_id = seed_post(&posts).await;
        let other = seed_post(&posts).await;

        comments.create(comment("first", Some(post_id))).await.unwrap();
        comments.create(comment("elsewhere", Some(other))).await.unwrap();
        comments.create(comment("second", Some(post_id))).await.unwrap();
        comments.create(comment("loose", None)).await.unwrap();

        let bodies: Vec<String> = comments
            .list_by_post(post_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(bodies, ["first", "second"]);
        assert_eq!(comments.list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn deleting_post_detaches_comments() {
        let (comments, posts) = repos().await;
        let post_id = seed_post(&posts).await;
        let created = comments.create(comment("attached", Some(post_id))).await.unwrap();

        assert!(posts.delete(post_id).await.unwrap());

        let orphan = comments.find(created.id).await.unwrap().unwrap();
        assert_eq!(orphan.post_id, None);
    }

    #[tokio::test]
    async fn create_rejects_unknown_post() {
        let (comments, _) = repos().await;
        assert!(comments.create(comment("dangling", Some(404))).await.is_err());
        assert!(comments.list_all().await.unwrap().is_empty());
    }
}
