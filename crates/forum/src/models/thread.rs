//! Thread domain types and read models.

use chrono::{DateTime, Utc};

use coding_gurus_core::{ReplyId, ThreadId, UserId, Username};

use super::reply::ReplyView;

/// A top-level discussion post.
///
/// `replies` lists the thread's replies in posting order.
#[derive(Debug, Clone)]
pub struct Thread {
    pub id: ThreadId,
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub post_time: DateTime<Utc>,
    pub last_edit_time: DateTime<Utc>,
    /// Bumped whenever a reply is added.
    pub last_thread_update: DateTime<Utc>,
    pub replies: Vec<ReplyId>,
}

/// A row on the thread list page.
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub title: String,
    pub content: String,
    pub author: Username,
    pub post_time: DateTime<Utc>,
    pub last_thread_update: DateTime<Utc>,
    pub reply_count: i64,
}

/// Everything the thread page shows: the thread, its author, and its
/// replies with their authors.
#[derive(Debug, Clone)]
pub struct ThreadDetail {
    pub thread: Thread,
    pub author: Username,
    pub replies: Vec<ReplyView>,
}

impl ThreadDetail {
    /// Whether `user_id` wrote this thread.
    #[must_use]
    pub fn is_author(&self, user_id: UserId) -> bool {
        self.thread.author_id == user_id
    }

    /// Whether the thread was edited after it was posted.
    #[must_use]
    pub fn was_edited(&self) -> bool {
        self.thread.last_edit_time > self.thread.post_time
    }
}
