//! SQLite comment store.
//!
//! One table, `comments`, holds primaries and replies alike. A range read runs
//! two statements inside one transaction so both levels come from the same
//! snapshot. Replies are bounded per parent with `ROW_NUMBER()`.

use async_trait::async_trait;
use chrono::Utc;
use spiro_core::comment::{ArticleId, Comment, CommentId, NO_PARENT};
use spiro_core::error::StoreError;
use spiro_core::store::{CommentStore, RangeFetch, RangeQuery};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

const SELECT_PRIMARIES: &str = r#"
    SELECT comment_id, parent_comment_id, article_id, author_id, author_name, content, created_at
    FROM comments
    WHERE article_id = ? AND parent_comment_id = 0
    ORDER BY comment_id
    LIMIT ? OFFSET ?
"#;

const SELECT_SUBS: &str = r#"
    SELECT comment_id, parent_comment_id, article_id, author_id, author_name, content, created_at
    FROM (
        SELECT c.*,
               ROW_NUMBER() OVER (PARTITION BY c.parent_comment_id ORDER BY c.comment_id) AS rn
        FROM comments c
        WHERE c.article_id = ?
          AND c.parent_comment_id IN (
              SELECT comment_id FROM comments
              WHERE article_id = ? AND parent_comment_id = 0
              ORDER BY comment_id
              LIMIT ? OFFSET ?
          )
    )
    WHERE rn <= ?
    ORDER BY parent_comment_id, comment_id
"#;

/// A SQLite comment store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a SQLite comment store.
    ///
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // A shared-cache memory database only lives while a connection is open.
        let pool_options = if path.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite comment store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                comment_id        INTEGER PRIMARY KEY AUTOINCREMENT,
                parent_comment_id INTEGER NOT NULL DEFAULT 0,
                article_id        INTEGER NOT NULL,
                author_id         INTEGER NOT NULL,
                author_name       TEXT NOT NULL DEFAULT '',
                content           TEXT NOT NULL,
                created_at        TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("comments table: {e}")))?;

        // Serves both the primary window and the per-parent reply scan.
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_comments_article_parent \
             ON comments(article_id, parent_comment_id, comment_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("article/parent index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `Comment` from a SQLite row.
    fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Result<Comment, StoreError> {
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::QueryFailed(format!("created_at column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::QueryFailed(format!("created_at value {created_at_str}: {e}")))?;

        Ok(Comment {
            comment_id: Self::column_u64(row, "comment_id")?,
            parent_comment_id: Self::column_u64(row, "parent_comment_id")?,
            article_id: Self::column_u64(row, "article_id")?,
            author_id: Self::column_u64(row, "author_id")?,
            author_name: row
                .try_get("author_name")
                .map_err(|e| StoreError::QueryFailed(format!("author_name column: {e}")))?,
            content: row
                .try_get("content")
                .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?,
            created_at,
        })
    }

    /// SQLite integers are signed; ids and authors never are.
    fn column_u64(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<u64, StoreError> {
        let value: i64 = row
            .try_get(column)
            .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))?;
        u64::try_from(value)
            .map_err(|_| StoreError::QueryFailed(format!("{column} is negative: {value}")))
    }

    fn to_sql(value: u64, what: &str) -> Result<i64, StoreError> {
        i64::try_from(value).map_err(|_| StoreError::QueryFailed(format!("{what} out of range: {value}")))
    }
}

#[async_trait]
impl CommentStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find_range(&self, query: RangeQuery) -> Result<RangeFetch, StoreError> {
        let article_id = Self::to_sql(query.article_id, "article_id")?;
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let primary_limit = i64::try_from(query.primary_limit).unwrap_or(i64::MAX);
        let sub_limit = i64::try_from(query.sub_limit_per_primary).unwrap_or(i64::MAX);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("Begin failed: {e}")))?;

        let primary_rows = sqlx::query(SELECT_PRIMARIES)
            .bind(article_id)
            .bind(primary_limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Primary window: {e}")))?;

        let primaries = primary_rows
            .iter()
            .map(Self::row_to_comment)
            .collect::<Result<Vec<_>, _>>()?;

        let subs = if primaries.is_empty() || sub_limit == 0 {
            Vec::new()
        } else {
            let sub_rows = sqlx::query(SELECT_SUBS)
                .bind(article_id)
                .bind(article_id)
                .bind(primary_limit)
                .bind(offset)
                .bind(sub_limit)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| StoreError::QueryFailed(format!("Reply window: {e}")))?;
            sub_rows
                .iter()
                .map(Self::row_to_comment)
                .collect::<Result<Vec<_>, _>>()?
        };

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("Commit failed: {e}")))?;

        Ok(RangeFetch::new(primaries, subs))
    }

    async fn insert(&self, comment: Comment) -> Result<CommentId, StoreError> {
        let article_id = Self::to_sql(comment.article_id, "article_id")?;
        let author_id = Self::to_sql(comment.author_id, "author_id")?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("Begin failed: {e}")))?;

        if let Some(parent_id) = comment.parent() {
            let parent = sqlx::query(
                "SELECT parent_comment_id, article_id FROM comments WHERE comment_id = ?",
            )
            .bind(Self::to_sql(parent_id, "parent_comment_id")?)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Parent lookup: {e}")))?;

            let valid = match parent {
                Some(row) => {
                    Self::column_u64(&row, "parent_comment_id")? == NO_PARENT
                        && Self::column_u64(&row, "article_id")? == comment.article_id
                }
                None => false,
            };
            if !valid {
                return Err(StoreError::InvalidParent {
                    comment_id: comment.comment_id,
                    parent_comment_id: parent_id,
                    article_id: comment.article_id,
                });
            }
        }

        let result = if comment.comment_id == 0 {
            sqlx::query(
                "INSERT INTO comments (parent_comment_id, article_id, author_id, author_name, content, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(Self::to_sql(comment.parent_comment_id, "parent_comment_id")?)
            .bind(article_id)
            .bind(author_id)
            .bind(comment.author_name.as_str())
            .bind(comment.content.as_str())
            .bind(comment.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
        } else {
            sqlx::query(
                "INSERT INTO comments (comment_id, parent_comment_id, article_id, author_id, author_name, content, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Self::to_sql(comment.comment_id, "comment_id")?)
            .bind(Self::to_sql(comment.parent_comment_id, "parent_comment_id")?)
            .bind(article_id)
            .bind(author_id)
            .bind(comment.author_name.as_str())
            .bind(comment.content.as_str())
            .bind(comment.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
        };

        let result = result.map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::Conflict(comment.comment_id),
            _ => StoreError::Storage(format!("Insert failed: {e}")),
        })?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("Commit failed: {e}")))?;

        u64::try_from(result.last_insert_rowid())
            .map_err(|_| StoreError::Storage("negative rowid".into()))
    }

    async fn count(&self, article_id: ArticleId) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM comments WHERE article_id = ?")
            .bind(Self::to_sql(article_id, "article_id")?)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Count failed: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::QueryFailed(format!("cnt column: {e}")))?;
        Ok(cnt as usize)
    }
}
