//! Database access for the forum.
//!
//! # Schema: `forum`
//!
//! - `users` - Registered members with their Argon2 password hashes
//! - `threads` - Top-level posts
//! - `replies` - Comments, `thread_id` references `threads` with `ON DELETE CASCADE`
//!
//! Sessions live in `tower_sessions.session`, managed by `tower-sessions-sqlx-store`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/forum/migrations/` and run via:
//! ```bash
//! cargo run -p coding-gurus-cli -- migrate
//! ```
//!
//! Handlers only see the [`UserRepository`] and [`ThreadRepository`] traits.
//! `PostgreSQL` implementations live in [`users`] and [`threads`]; an
//! in-memory implementation for tests lives in `memory` (feature `testing`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use coding_gurus_core::{Email, ReplyId, ThreadId, UserId, Username};

use crate::models::{Reply, Thread, ThreadDetail, ThreadSummary, User};

#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod threads;
pub mod users;

pub use threads::PgThreadRepository;
pub use users::PgUserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation. Holds the name of the colliding field.
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Storage for registered users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict("email" | "username")` if either is taken.
    async fn create(
        &self,
        email: &Email,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;

    /// Load a user together with their password hash, for login.
    async fn get_credentials_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError>;
}

/// Storage for threads and their replies.
///
/// Every load-by-id returns `Option`; mutations that target a missing row
/// return `false` or `RepositoryError::NotFound`.
#[async_trait]
pub trait ThreadRepository: Send + Sync {
    /// All threads, most recently active first (ties: newest id first).
    async fn list(&self) -> Result<Vec<ThreadSummary>, RepositoryError>;

    /// Load a thread with its reply references.
    async fn get(&self, id: ThreadId) -> Result<Option<Thread>, RepositoryError>;

    /// Load a thread with its author and replies resolved.
    async fn get_detail(&self, id: ThreadId) -> Result<Option<ThreadDetail>, RepositoryError>;

    /// Insert a thread with `post_time = last_edit_time = last_thread_update = now`.
    async fn create(
        &self,
        author: UserId,
        title: &str,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<ThreadId, RepositoryError>;

    /// Replace title and content. Returns `false` if the thread is gone.
    async fn update(
        &self,
        id: ThreadId,
        title: &str,
        content: &str,
        last_edit_time: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Delete a thread and all of its replies atomically.
    async fn delete(&self, id: ThreadId) -> Result<bool, RepositoryError>;

    /// Load a single reply.
    async fn get_reply(&self, id: ReplyId) -> Result<Option<Reply>, RepositoryError>;

    /// Append a reply and bump the thread's `last_thread_update` atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the thread does not exist.
    async fn create_reply(
        &self,
        thread_id: ThreadId,
        author: UserId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<ReplyId, RepositoryError>;

    /// Remove a reply from its thread. Returns `false` if no such reply
    /// belongs to the thread.
    async fn delete_reply(
        &self,
        thread_id: ThreadId,
        reply_id: ReplyId,
    ) -> Result<bool, RepositoryError>;

    /// Verify the backing store is reachable.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}
