//! Generic repository over one entity kind.
//!
//! Entity-specific SQL lives next to each entity (`posts::repo`,
//! `comments::repo`); this module owns the shared reads, deletes and the
//! read-modify-write update protocol.

use std::{fmt::Display, marker::PhantomData};

use anyhow::Context;
use async_trait::async_trait;
use axum::extract::FromRef;
use sqlx::{sqlite::SqliteRow, Encode, FromRow, Sqlite, SqliteConnection, SqlitePool, Type};
use tracing::debug;

use crate::state::AppState;

pub mod patch;

/// A table-backed entity keyed by a store-assigned identity.
#[async_trait]
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static {
    /// Identity type: `i64` for rowid tables, `Uuid` for users.
    type Id: for<'q> Encode<'q, Sqlite> + Type<Sqlite> + Display + Copy + Send + Sync + 'static;

    /// Human-readable kind, used in logs and not-found messages.
    const KIND: &'static str;
    const TABLE: &'static str;
    /// Column list for `SELECT` and `RETURNING`, identity first.
    const COLUMNS: &'static str;

    /// Write every mutable column of `self` to the row keyed by `id` and
    /// return the row as stored. The identity column itself is never written.
    async fn save(&self, id: Self::Id, conn: &mut SqliteConnection) -> sqlx::Result<Self>;
}

/// A partial update: applies only the fields the caller provided.
pub trait Merge<T> {
    fn merge_into(self, target: &mut T);
}

pub struct Repository<T> {
    db: SqlitePool,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _kind: PhantomData,
        }
    }
}

impl<T: Record> FromRef<AppState> for Repository<T> {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.db.clone())
    }
}

async fn fetch_by_id<T: Record>(conn: &mut SqliteConnection, id: T::Id) -> sqlx::Result<Option<T>> {
    let sql = format!("SELECT {} FROM {} WHERE id = ?1", T::COLUMNS, T::TABLE);
    sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

impl<T: Record> Repository<T> {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            _kind: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    pub async fn list_all(&self) -> anyhow::Result<Vec<T>> {
        let sql = format!("SELECT {} FROM {} ORDER BY id", T::COLUMNS, T::TABLE);
        let rows = sqlx::query_as::<_, T>(&sql)
            .fetch_all(&self.db)
            .await
            .with_context(|| format!("list {}", T::TABLE))?;
        Ok(rows)
    }

    pub async fn find(&self, id: T::Id) -> anyhow::Result<Option<T>> {
        let mut conn = self.db.acquire().await.context("acquire connection")?;
        let row = fetch_by_id::<T>(&mut conn, id)
            .await
            .with_context(|| format!("find {} {}", T::TABLE, id))?;
        Ok(row)
    }

    /// Apply `changes` onto the row keyed by `id`.
    ///
    /// Load, merge and write happen in one transaction; `Ok(None)` means the
    /// row does not exist and nothing was written. The returned row is the
    /// one read back by the write, so it reflects store-side defaults.
    pub async fn update<C>(&self, id: T::Id, changes: C) -> anyhow::Result<Option<T>>
    where
        C: Merge<T> + Send,
    {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let Some(mut row) = fetch_by_id::<T>(&mut tx, id)
            .await
            .with_context(|| format!("load {} {}", T::TABLE, id))?
        else {
            debug!(kind = T::KIND, %id, "update target missing");
            return Ok(None);
        };

        changes.merge_into(&mut row);
        let stored = row
            .save(id, &mut tx)
            .await
            .with_context(|| format!("save {} {}", T::TABLE, id))?;

        tx.commit().await.context("commit tx")?;
        debug!(kind = T::KIND, %id, "row updated");
        Ok(Some(stored))
    }

    /// Remove the row keyed by `id`; `false` when there was nothing to remove.
    pub async fn delete(&self, id: T::Id) -> anyhow::Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", T::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.db)
            .await
            .with_context(|| format!("delete {} {}", T::TABLE, id))?;
        let removed = result.rows_affected() > 0;
        debug!(kind = T::KIND, %id, removed, "delete");
        Ok(removed)
    }
}
