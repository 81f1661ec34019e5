//! Thread and reply operations.
//!
//! Ownership is checked by [`super::authorization`] before any mutation
//! here runs. This service only stamps times and talks to storage.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use thiserror::Error;

use coding_gurus_core::{ReplyId, ThreadId, UserId};

use crate::db::{RepositoryError, ThreadRepository};
use crate::error::Resource;
use crate::models::{Thread, ThreadDetail, ThreadSummary};
use crate::validation::{ValidReply, ValidThread};

/// Errors from forum operations.
#[derive(Debug, Error)]
pub enum ForumError {
    /// The thread or reply does not exist.
    #[error("{0} not found")]
    NotFound(Resource),

    /// The principal is not the author.
    #[error("not the author of thread {thread_id} or its reply")]
    Forbidden { thread_id: ThreadId },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Current time at the storage precision (microseconds).
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Edit time for an update: now, but always strictly after `previous`.
#[must_use]
pub fn next_edit_time(previous: DateTime<Utc>) -> DateTime<Utc> {
    now().max(previous + Duration::microseconds(1))
}

/// Forum service.
pub struct ForumService<'a> {
    threads: &'a dyn ThreadRepository,
}

impl<'a> ForumService<'a> {
    #[must_use]
    pub const fn new(threads: &'a dyn ThreadRepository) -> Self {
        Self { threads }
    }

    /// Every thread, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::Repository` if storage fails.
    pub async fn list_threads(&self) -> Result<Vec<ThreadSummary>, ForumError> {
        Ok(self.threads.list().await?)
    }

    /// A thread with its author and replies.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the thread does not exist.
    pub async fn thread_detail(&self, id: ThreadId) -> Result<ThreadDetail, ForumError> {
        self.threads
            .get_detail(id)
            .await?
            .ok_or(ForumError::NotFound(Resource::Thread))
    }

    /// Post a new thread.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::Repository` if storage fails.
    pub async fn create_thread(
        &self,
        author: UserId,
        input: &ValidThread,
    ) -> Result<ThreadId, ForumError> {
        let id = self
            .threads
            .create(author, &input.title, &input.content, now())
            .await?;
        tracing::info!(thread_id = %id, author_id = %author, "Thread created");
        Ok(id)
    }

    /// Replace a thread's title and content.
    ///
    /// `last_thread_update` is left alone; only replies bump it.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the thread vanished meanwhile.
    pub async fn update_thread(
        &self,
        thread: &Thread,
        input: &ValidThread,
    ) -> Result<(), ForumError> {
        let edited_at = next_edit_time(thread.last_edit_time);
        let updated = self
            .threads
            .update(thread.id, &input.title, &input.content, edited_at)
            .await?;
        if !updated {
            return Err(ForumError::NotFound(Resource::Thread));
        }
        tracing::info!(thread_id = %thread.id, "Thread updated");
        Ok(())
    }

    /// Delete a thread and every reply in it.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the thread does not exist.
    pub async fn delete_thread(&self, id: ThreadId) -> Result<(), ForumError> {
        if !self.threads.delete(id).await? {
            return Err(ForumError::NotFound(Resource::Thread));
        }
        tracing::info!(thread_id = %id, "Thread deleted");
        Ok(())
    }

    /// Reply to a thread, bumping its last activity.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the thread does not exist.
    pub async fn create_reply(
        &self,
        thread_id: ThreadId,
        author: UserId,
        input: &ValidReply,
    ) -> Result<ReplyId, ForumError> {
        let id = self
            .threads
            .create_reply(thread_id, author, &input.content, now())
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ForumError::NotFound(Resource::Thread),
                other => ForumError::Repository(other),
            })?;
        tracing::info!(thread_id = %thread_id, reply_id = %id, "Reply created");
        Ok(id)
    }

    /// Delete one reply from a thread.
    ///
    /// # Errors
    ///
    /// Returns `ForumError::NotFound` if the reply is not in the thread.
    pub async fn delete_reply(
        &self,
        thread_id: ThreadId,
        reply_id: ReplyId,
    ) -> Result<(), ForumError> {
        if !self.threads.delete_reply(thread_id, reply_id).await? {
            return Err(ForumError::NotFound(Resource::Reply));
        }
        tracing::info!(thread_id = %thread_id, reply_id = %reply_id, "Reply deleted");
        Ok(())
    }
}
