//! Reply route handlers.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use coding_gurus_core::{ReplyId, ThreadId};

use super::{FormBody, IdPath};
use crate::error::{Result, forum_breadcrumb};
use crate::middleware::{Flash, RequireAuth};
use crate::services::authorization::authorize_reply_owner;
use crate::services::forum::ForumService;
use crate::state::AppState;
use crate::validation::ReplyPayload;

/// Handle reply submission.
#[instrument(skip(user, state, payload), fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    IdPath(thread_id): IdPath<ThreadId>,
    FormBody(payload): FormBody<ReplyPayload>,
) -> Result<Response> {
    let input = state.validator().reply(&payload)?;
    let reply_id = ForumService::new(state.threads())
        .create_reply(thread_id, user.id, &input)
        .await?;

    forum_breadcrumb("Created reply", thread_id, Some(reply_id));

    Ok((
        Flash::success("Successfully created new reply."),
        Redirect::to(&format!("/threads/{thread_id}")),
    )
        .into_response())
}

/// Delete a reply. Only its author may do this.
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    IdPath((thread_id, reply_id)): IdPath<(ThreadId, ReplyId)>,
) -> Result<Response> {
    authorize_reply_owner(state.threads(), &user, thread_id, reply_id).await?;
    ForumService::new(state.threads())
        .delete_reply(thread_id, reply_id)
        .await?;

    forum_breadcrumb("Deleted reply", thread_id, Some(reply_id));

    Ok((
        Flash::success("Successfully deleted the reply."),
        Redirect::to(&format!("/threads/{thread_id}")),
    )
        .into_response())
}
