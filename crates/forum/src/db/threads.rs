//! `PostgreSQL` thread and reply repository.
//!
//! A thread's reply collection is the set of `forum.replies` rows pointing at
//! it, ordered by `(reply_post_time, id)`. Writes that touch both tables run
//! in one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use coding_gurus_core::{ReplyId, ThreadId, UserId, Username};

use super::{RepositoryError, ThreadRepository};
use crate::models::{Reply, ReplyView, Thread, ThreadDetail, ThreadSummary};

#[derive(sqlx::FromRow)]
struct ThreadRow {
    id: ThreadId,
    author_id: UserId,
    title: String,
    content: String,
    post_time: DateTime<Utc>,
    last_edit_time: DateTime<Utc>,
    last_thread_update: DateTime<Utc>,
    replies: Vec<i32>,
}

impl From<ThreadRow> for Thread {
    fn from(row: ThreadRow) -> Self {
        Self {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            content: row.content,
            post_time: row.post_time,
            last_edit_time: row.last_edit_time,
            last_thread_update: row.last_thread_update,
            replies: row.replies.into_iter().map(ReplyId::new).collect(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: ThreadId,
    title: String,
    content: String,
    author: String,
    post_time: DateTime<Utc>,
    last_thread_update: DateTime<Utc>,
    reply_count: i64,
}

#[derive(sqlx::FromRow)]
struct ReplyRow {
    id: ReplyId,
    thread_id: ThreadId,
    author_id: UserId,
    content: String,
    reply_post_time: DateTime<Utc>,
    reply_last_edit_time: DateTime<Utc>,
}

impl From<ReplyRow> for Reply {
    fn from(row: ReplyRow) -> Self {
        Self {
            id: row.id,
            thread_id: row.thread_id,
            author_id: row.author_id,
            content: row.content,
            reply_post_time: row.reply_post_time,
            reply_last_edit_time: row.reply_last_edit_time,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReplyViewRow {
    #[sqlx(flatten)]
    reply: ReplyRow,
    author: String,
}

fn parse_username(raw: &str) -> Result<Username, RepositoryError> {
    Username::parse(raw).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
    })
}

const SELECT_THREAD: &str = r"
    SELECT t.id, t.author_id, t.title, t.content,
           t.post_time, t.last_edit_time, t.last_thread_update,
           COALESCE(
               array_agg(r.id ORDER BY r.reply_post_time, r.id) FILTER (WHERE r.id IS NOT NULL),
               '{}'
           ) AS replies
    FROM forum.threads t
    LEFT JOIN forum.replies r ON r.thread_id = t.id
    WHERE t.id = $1
    GROUP BY t.id
";

/// Repository for thread and reply database operations.
#[derive(Clone)]
pub struct PgThreadRepository {
    pool: PgPool,
}

impl PgThreadRepository {
    /// Create a new thread repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThreadRepository for PgThreadRepository {
    async fn list(&self) -> Result<Vec<ThreadSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r"
            SELECT t.id, t.title, t.content, u.username AS author,
                   t.post_time, t.last_thread_update,
                   (SELECT COUNT(*) FROM forum.replies r WHERE r.thread_id = t.id) AS reply_count
            FROM forum.threads t
            JOIN forum.users u ON u.id = t.author_id
            ORDER BY t.last_thread_update DESC, t.id DESC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ThreadSummary {
                    id: row.id,
                    title: row.title,
                    content: row.content,
                    author: parse_username(&row.author)?,
                    post_time: row.post_time,
                    last_thread_update: row.last_thread_update,
                    reply_count: row.reply_count,
                })
            })
            .collect()
    }

    async fn get(&self, id: ThreadId) -> Result<Option<Thread>, RepositoryError> {
        let row = sqlx::query_as::<_, ThreadRow>(SELECT_THREAD)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Thread::from))
    }

    async fn get_detail(&self, id: ThreadId) -> Result<Option<ThreadDetail>, RepositoryError> {
        let Some(thread) = self.get(id).await? else {
            return Ok(None);
        };

        let author: String = sqlx::query_scalar("SELECT username FROM forum.users WHERE id = $1")
            .bind(thread.author_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ReplyViewRow>(
            r"
            SELECT r.id, r.thread_id, r.author_id, r.content,
                   r.reply_post_time, r.reply_last_edit_time,
                   u.username AS author
            FROM forum.replies r
            JOIN forum.users u ON u.id = r.author_id
            WHERE r.thread_id = $1
            ORDER BY r.reply_post_time, r.id
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let replies = rows
            .into_iter()
            .map(|row| {
                Ok(ReplyView {
                    author: parse_username(&row.author)?,
                    reply: row.reply.into(),
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Some(ThreadDetail {
            author: parse_username(&author)?,
            thread,
            replies,
        }))
    }

    async fn create(
        &self,
        author: UserId,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<ThreadId, RepositoryError> {
        let id = sqlx::query_scalar::<_, ThreadId>(
            r"
            INSERT INTO forum.threads
                (author_id, title, content, post_time, last_edit_time, last_thread_update)
            VALUES ($1, $2, $3, $4, $4, $4)
            RETURNING id
            ",
        )
        .bind(author)
        .bind(title)
        .bind(content)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update(
        &self,
        id: ThreadId,
        title: &str,
        content: &str,
        last_edit_time: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE forum.threads
            SET title = $2, content = $3, last_edit_time = $4
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(last_edit_time)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ThreadId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let replies = sqlx::query("DELETE FROM forum.replies WHERE thread_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let thread = sqlx::query("DELETE FROM forum.threads WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if thread.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Ok(false);
        }

        tx.commit().await?;

        tracing::debug!(
            thread_id = %id,
            replies_deleted = replies.rows_affected(),
            "Thread deleted"
        );
        Ok(true)
    }

    async fn get_reply(&self, id: ReplyId) -> Result<Option<Reply>, RepositoryError> {
        let row = sqlx::query_as::<_, ReplyRow>(
            r"
            SELECT id, thread_id, author_id, content, reply_post_time, reply_last_edit_time
            FROM forum.replies
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Reply::from))
    }

    async fn create_reply(
        &self,
        thread_id: ThreadId,
        author: UserId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<ReplyId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query(
            r"
            UPDATE forum.threads
            SET last_thread_update = GREATEST(last_thread_update, $2)
            WHERE id = $1
            ",
        )
        .bind(thread_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let id = sqlx::query_scalar::<_, ReplyId>(
            r"
            INSERT INTO forum.replies
                (thread_id, author_id, content, reply_post_time, reply_last_edit_time)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id
            ",
        )
        .bind(thread_id)
        .bind(author)
        .bind(content)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn delete_reply(
        &self,
        thread_id: ThreadId,
        reply_id: ReplyId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM forum.replies WHERE id = $1 AND thread_id = $2")
            .bind(reply_id)
            .bind(thread_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
