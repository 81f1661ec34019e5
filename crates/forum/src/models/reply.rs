//! Reply domain types.

use chrono::{DateTime, Utc};

use coding_gurus_core::{ReplyId, ThreadId, UserId, Username};

/// A comment attached to exactly one thread.
#[derive(Debug, Clone)]
pub struct Reply {
    pub id: ReplyId,
    pub thread_id: ThreadId,
    pub author_id: UserId,
    pub content: String,
    pub reply_post_time: DateTime<Utc>,
    /// Set when the reply is posted. Replies cannot be edited.
    pub reply_last_edit_time: DateTime<Utc>,
}

/// A reply together with its author's username.
#[derive(Debug, Clone)]
pub struct ReplyView {
    pub reply: Reply,
    pub author: Username,
}

impl ReplyView {
    /// Whether `user_id` wrote this reply.
    #[must_use]
    pub fn is_author(&self, user_id: UserId) -> bool {
        self.reply.author_id == user_id
    }
}
