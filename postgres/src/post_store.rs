//! `PostgreSQL` implementation of [`PostStore`].

use post_bridge_core::post::{Post, PostKey};
use post_bridge_core::store::{PostStore, StoreError};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::future::Future;

const SELECT_ALL: &str = "SELECT country, id, issue_id, content FROM posts";

const SELECT_BY_KEY: &str =
    "SELECT country, id, issue_id, content FROM posts WHERE country = $1 AND id = $2";

/// `PostgreSQL`-backed post store.
///
/// Each operation is a single statement, so row-level locking gives every
/// call atomic semantics. Concurrent writers to the same key serialize on the
/// primary key.
///
/// # Example
///
/// ```no_run
/// use post_bridge_postgres::PostgresPostStore;
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresPostStore::from_pool(pool);
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PostgresPostStore {
    pool: PgPool,
}

impl PostgresPostStore {
    /// Connect to `database_url` with at most `max_connections` pooled connections.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DatabaseError`] if the connection cannot be established.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Failed to connect: {e}")))?;

        tracing::info!(max_connections, "Connected to PostgreSQL post store");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DatabaseError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, StoreError> {
    let read = |e: sqlx::Error| StoreError::CorruptRecord(e.to_string());

    Ok(Post {
        key: PostKey {
            partition: row.try_get("country").map_err(read)?,
            id: row.try_get("id").map_err(read)?,
        },
        issue_id: row.try_get("issue_id").map_err(read)?,
        content: row.try_get("content").map_err(read)?,
    })
}

fn database_error(operation: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| {
        metrics::counter!("post_bridge.store.errors", "operation" => operation).increment(1);
        StoreError::DatabaseError(format!("Failed to {operation}: {e}"))
    }
}

impl PostStore for PostgresPostStore {
    fn upsert(&self, post: Post) -> impl Future<Output = Result<Post, StoreError>> + Send {
        async move {
            let row = sqlx::query(
                r"
                INSERT INTO posts (country, id, issue_id, content)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (country, id)
                DO UPDATE SET issue_id = EXCLUDED.issue_id, content = EXCLUDED.content
                RETURNING country, id, issue_id, content
                ",
            )
            .bind(&post.key.partition)
            .bind(post.key.id)
            .bind(post.issue_id)
            .bind(&post.content)
            .fetch_one(&self.pool)
            .await
            .map_err(database_error("upsert post"))?;

            post_from_row(&row)
        }
    }

    fn find_by_id(
        &self,
        partition: &str,
        id: i64,
    ) -> impl Future<Output = Result<Option<Post>, StoreError>> + Send {
        let partition = partition.to_string();

        async move {
            let row = sqlx::query(SELECT_BY_KEY)
                .bind(&partition)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(database_error("find post"))?;

            row.as_ref().map(post_from_row).transpose()
        }
    }

    fn find_all(&self) -> impl Future<Output = Result<Vec<Post>, StoreError>> + Send {
        async move {
            let rows = sqlx::query(SELECT_ALL)
                .fetch_all(&self.pool)
                .await
                .map_err(database_error("list posts"))?;

            rows.iter().map(post_from_row).collect()
        }
    }

    fn delete(&self, post: &Post) -> impl Future<Output = Result<(), StoreError>> + Send {
        let key = post.key.clone();
        self.delete_by_id_owned(key.partition, key.id)
    }

    fn delete_by_id(
        &self,
        partition: &str,
        id: i64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        self.delete_by_id_owned(partition.to_string(), id)
    }
}

impl PostgresPostStore {
    async fn delete_by_id_owned(&self, partition: String, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM posts WHERE country = $1 AND id = $2")
            .bind(&partition)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(database_error("delete post"))?;

        tracing::debug!(
            partition = %partition,
            id,
            rows = result.rows_affected(),
            "Post delete executed"
        );
        Ok(())
    }
}
