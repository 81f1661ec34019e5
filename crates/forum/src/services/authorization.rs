//! Ownership checks.
//!
//! Only the author of a thread or reply may change it. Each check loads the
//! resource and hands it back so the caller does not load it twice.

use coding_gurus_core::{ReplyId, ThreadId};

use super::forum::ForumError;
use crate::db::ThreadRepository;
use crate::error::Resource;
use crate::models::{CurrentUser, Reply, Thread};

/// Load a thread the principal may edit or delete.
///
/// # Errors
///
/// Returns `ForumError::NotFound` if the thread does not exist, or
/// `ForumError::Forbidden` if someone else wrote it.
pub async fn authorize_thread_owner(
    threads: &dyn ThreadRepository,
    principal: &CurrentUser,
    thread_id: ThreadId,
) -> Result<Thread, ForumError> {
    let thread = threads
        .get(thread_id)
        .await?
        .ok_or(ForumError::NotFound(Resource::Thread))?;

    if thread.author_id != principal.id {
        tracing::warn!(
            thread_id = %thread_id,
            user_id = %principal.id,
            "Rejected change to another user's thread"
        );
        return Err(ForumError::Forbidden { thread_id });
    }

    Ok(thread)
}

/// Load a reply in `thread_id` that the principal may delete.
///
/// A reply that exists but belongs to another thread counts as missing.
///
/// # Errors
///
/// Returns `ForumError::NotFound` or `ForumError::Forbidden`.
pub async fn authorize_reply_owner(
    threads: &dyn ThreadRepository,
    principal: &CurrentUser,
    thread_id: ThreadId,
    reply_id: ReplyId,
) -> Result<Reply, ForumError> {
    let reply = threads
        .get_reply(reply_id)
        .await?
        .filter(|reply| reply.thread_id == thread_id)
        .ok_or(ForumError::NotFound(Resource::Reply))?;

    if reply.author_id != principal.id {
        tracing::warn!(
            thread_id = %thread_id,
            reply_id = %reply_id,
            user_id = %principal.id,
            "Rejected change to another user's reply"
        );
        return Err(ForumError::Forbidden { thread_id });
    }

    Ok(reply)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use coding_gurus_core::{Email, Username};

    use super::*;
    use crate::db::UserRepository;
    use crate::db::memory::MemoryRepository;
    use crate::services::forum::now;

    async fn principal(repo: &MemoryRepository, name: &str) -> CurrentUser {
        let user = UserRepository::create(
            repo,
            &Email::parse(&format!("{name}@example.com")).unwrap(),
            &Username::parse(name).unwrap(),
            "hash",
        )
        .await
        .unwrap();
        CurrentUser::from(&user)
    }

    #[tokio::test]
    async fn test_thread_owner_checks() {
        let repo = MemoryRepository::new();
        let ada = principal(&repo, "ada").await;
        let bob = principal(&repo, "bob").await;
        let id = ThreadRepository::create(&repo, ada.id, "t", "c", now())
            .await
            .unwrap();

        let thread = authorize_thread_owner(&repo, &ada, id).await.unwrap();
        assert_eq!(thread.id, id);

        assert!(matches!(
            authorize_thread_owner(&repo, &bob, id).await,
            Err(ForumError::Forbidden { thread_id }) if thread_id == id
        ));
        assert!(matches!(
            authorize_thread_owner(&repo, &ada, ThreadId::new(404)).await,
            Err(ForumError::NotFound(Resource::Thread))
        ));
    }

    #[tokio::test]
    async fn test_reply_owner_checks() {
        let repo = MemoryRepository::new();
        let ada = principal(&repo, "ada").await;
        let bob = principal(&repo, "bob").await;
        let thread = ThreadRepository::create(&repo, ada.id, "t", "c", now())
            .await
            .unwrap();
        let other = ThreadRepository::create(&repo, ada.id, "u", "c", now())
            .await
            .unwrap();
        let reply = repo.create_reply(thread, bob.id, "mine", now()).await.unwrap();

        assert!(authorize_reply_owner(&repo, &bob, thread, reply).await.is_ok());
        assert!(matches!(
            authorize_reply_owner(&repo, &ada, thread, reply).await,
            Err(ForumError::Forbidden { .. })
        ));
        assert!(matches!(
            authorize_reply_owner(&repo, &bob, other, reply).await,
            Err(ForumError::NotFound(Resource::Reply))
        ));
    }
}
