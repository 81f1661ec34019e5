//! In-memory repositories for tests.
//!
//! [`MemoryRepository`] implements both repository traits over one
//! `tokio::sync::RwLock`, so a reply insert and its thread bump happen under
//! the same write guard.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use coding_gurus_core::{Email, ReplyId, ThreadId, UserId, Username};

use super::{RepositoryError, ThreadRepository, UserRepository};
use crate::models::{Reply, ReplyView, Thread, ThreadDetail, ThreadSummary, User};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, (User, String)>,
    threads: BTreeMap<ThreadId, Thread>,
    replies: BTreeMap<ReplyId, Reply>,
    last_id: i32,
}

impl Tables {
    /// Sequential ids shared across tables, like a single sequence.
    const fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn username(&self, id: UserId) -> Result<Username, RepositoryError> {
        self.users
            .get(&id)
            .map(|(user, _)| user.username.clone())
            .ok_or_else(|| RepositoryError::DataCorruption(format!("dangling author {id}")))
    }
}

/// Thread-safe in-memory store standing in for `PostgreSQL`.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of replies stored, across all threads.
    pub async fn reply_count(&self) -> usize {
        self.tables.read().await.replies.len()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn create(
        &self,
        email: &Email,
        username: &Username,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;

        for (existing, _) in tables.users.values() {
            if existing.email == *email {
                return Err(RepositoryError::Conflict("email".to_owned()));
            }
            if existing.username == *username {
                return Err(RepositoryError::Conflict("username".to_owned()));
            }
        }

        let user = User {
            id: UserId::new(tables.next_id()),
            email: email.clone(),
            username: username.clone(),
            created_at: Utc::now(),
        };
        tables
            .users
            .insert(user.id, (user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn get_credentials_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|(user, _)| user.username == *username)
            .cloned())
    }
}

#[async_trait]
impl ThreadRepository for MemoryRepository {
    async fn list(&self) -> Result<Vec<ThreadSummary>, RepositoryError> {
        let tables = self.tables.read().await;

        let mut summaries = tables
            .threads
            .values()
            .map(|thread| {
                Ok(ThreadSummary {
                    id: thread.id,
                    title: thread.title.clone(),
                    content: thread.content.clone(),
                    author: tables.username(thread.author_id)?,
                    post_time: thread.post_time,
                    last_thread_update: thread.last_thread_update,
                    reply_count: i64::try_from(thread.replies.len()).unwrap_or(i64::MAX),
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        summaries.sort_by(|a, b| {
            b.last_thread_update
                .cmp(&a.last_thread_update)
                .then(b.id.cmp(&a.id))
        });
        Ok(summaries)
    }

    async fn get(&self, id: ThreadId) -> Result<Option<Thread>, RepositoryError> {
        Ok(self.tables.read().await.threads.get(&id).cloned())
    }

    async fn get_detail(&self, id: ThreadId) -> Result<Option<ThreadDetail>, RepositoryError> {
        let tables = self.tables.read().await;
        let Some(thread) = tables.threads.get(&id) else {
            return Ok(None);
        };

        let replies = thread
            .replies
            .iter()
            .filter_map(|reply_id| tables.replies.get(reply_id))
            .map(|reply| {
                Ok(ReplyView {
                    author: tables.username(reply.author_id)?,
                    reply: reply.clone(),
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Some(ThreadDetail {
            author: tables.username(thread.author_id)?,
            thread: thread.clone(),
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
        let mut tables = self.tables.write().await;
        let id = ThreadId::new(tables.next_id());

        tables.threads.insert(
            id,
            Thread {
                id,
                author_id: author,
                title: title.to_owned(),
                content: content.to_owned(),
                post_time: now,
                last_edit_time: now,
                last_thread_update: now,
                replies: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn update(
        &self,
        id: ThreadId,
        title: &str,
        content: &str,
        last_edit_time: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(thread) = tables.threads.get_mut(&id) else {
            return Ok(false);
        };

        title.clone_into(&mut thread.title);
        content.clone_into(&mut thread.content);
        thread.last_edit_time = last_edit_time;
        Ok(true)
    }

    async fn delete(&self, id: ThreadId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(thread) = tables.threads.remove(&id) else {
            return Ok(false);
        };

        for reply_id in &thread.replies {
            tables.replies.remove(reply_id);
        }
        Ok(true)
    }

    async fn get_reply(&self, id: ReplyId) -> Result<Option<Reply>, RepositoryError> {
        Ok(self.tables.read().await.replies.get(&id).cloned())
    }

    async fn create_reply(
        &self,
        thread_id: ThreadId,
        author: UserId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<ReplyId, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.threads.contains_key(&thread_id) {
            return Err(RepositoryError::NotFound);
        }

        let id = ReplyId::new(tables.next_id());
        tables.replies.insert(
            id,
            Reply {
                id,
                thread_id,
                author_id: author,
                content: content.to_owned(),
                reply_post_time: now,
                reply_last_edit_time: now,
            },
        );

        if let Some(thread) = tables.threads.get_mut(&thread_id) {
            thread.replies.push(id);
            thread.last_thread_update = thread.last_thread_update.max(now);
        }
        Ok(id)
    }

    async fn delete_reply(
        &self,
        thread_id: ThreadId,
        reply_id: ReplyId,
    ) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        let belongs = tables
            .replies
            .get(&reply_id)
            .is_some_and(|reply| reply.thread_id == thread_id);
        if !belongs {
            return Ok(false);
        }

        tables.replies.remove(&reply_id);
        if let Some(thread) = tables.threads.get_mut(&thread_id) {
            thread.replies.retain(|id| *id != reply_id);
        }
        Ok(true)
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
