use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::repository::{Merge, Record, Repository};

pub type UserRepository = Repository<User>;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String, // Argon2 PHC string, never exposed in JSON
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

/// Resolved user update: email already normalised, password already hashed.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub hashed_password: Option<String>,
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_verified: Option<bool>,
}

#[async_trait]
impl Record for User {
    type Id = Uuid;

    const KIND: &'static str = "User";
    const TABLE: &'static str = "\"user\"";
    const COLUMNS: &'static str =
        "id, email, hashed_password, is_active, is_superuser, is_verified";

    async fn save(&self, id: Uuid, conn: &mut SqliteConnection) -> sqlx::Result<Self> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE "user"
               SET email = ?1, hashed_password = ?2, is_active = ?3,
                   is_superuser = ?4, is_verified = ?5
             WHERE id = ?6
            RETURNING id, email, hashed_password, is_active, is_superuser, is_verified
            "#,
        )
        .bind(self.email.as_str())
        .bind(self.hashed_password.as_str())
        .bind(self.is_active)
        .bind(self.is_superuser)
        .bind(self.is_verified)
        .bind(id)
        .fetch_one(conn)
        .await
    }
}

impl Merge<User> for UserChanges {
    fn merge_into(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(hashed_password) = self.hashed_password {
            user.hashed_password = hashed_password;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
        if let Some(is_superuser) = self.is_superuser {
            user.is_superuser = is_superuser;
        }
        if let Some(is_verified) = self.is_verified {
            user.is_verified = is_verified;
        }
    }
}

impl User {
    /// Find a user by (already normalized) email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, is_active, is_superuser, is_verified
            FROM "user"
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, hashed_password, is_active, is_superuser, is_verified
            FROM "user"
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create an active user. Superusers are created verified.
    pub async fn create(
        db: &SqlitePool,
        email: &str,
        hashed_password: &str,
        is_superuser: bool,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO "user" (id, email, hashed_password, is_active, is_superuser, is_verified)
            VALUES (?1, ?2, ?3, 1, ?4, ?4)
            RETURNING id, email, hashed_password, is_active, is_superuser, is_verified
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .bind(is_superuser)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}
