//! Thread route handlers.
//!
//! Mutating handlers run in a fixed order: authentication (extractor),
//! validation, ownership check, then the write.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use tracing::instrument;

use coding_gurus_core::{ReplyId, ThreadId, UserId};

use super::{FormBody, IdPath};
use crate::error::{Result, forum_breadcrumb};
use crate::filters;
use crate::middleware::{Flash, PageContext, RequireAuth};
use crate::models::{ReplyView, ThreadDetail, ThreadSummary};
use crate::services::authorization::authorize_thread_owner;
use crate::services::forum::ForumService;
use crate::state::AppState;
use crate::validation::ThreadPayload;

/// Display format for post and edit times.
const TIME_FORMAT: &str = "%b %-d, %Y %H:%M UTC";

/// Longest content excerpt shown on the list page, in characters.
const EXCERPT_CHARS: usize = 160;

fn format_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn excerpt(content: &str) -> String {
    let mut chars = content.chars();
    let mut short: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        short.push_str("...");
    }
    short
}

// =============================================================================
// View Types
// =============================================================================

/// Thread row for the list page.
#[derive(Debug, Clone)]
pub struct ThreadListItem {
    pub id: ThreadId,
    pub title: String,
    pub excerpt: String,
    pub author: String,
    pub posted: String,
    pub last_activity: String,
    pub replies_label: String,
}

impl From<&ThreadSummary> for ThreadListItem {
    fn from(summary: &ThreadSummary) -> Self {
        let noun = if summary.reply_count == 1 { "reply" } else { "replies" };
        Self {
            id: summary.id,
            title: summary.title.clone(),
            excerpt: excerpt(&summary.content),
            author: summary.author.to_string(),
            posted: format_time(summary.post_time),
            last_activity: format_time(summary.last_thread_update),
            replies_label: format!("{} {noun}", summary.reply_count),
        }
    }
}

/// Reply as shown under its thread.
#[derive(Debug, Clone)]
pub struct ReplyItem {
    pub id: ReplyId,
    pub content: String,
    pub author: String,
    pub posted: String,
    /// Whether the viewer wrote this reply.
    pub can_delete: bool,
}

impl ReplyItem {
    fn new(view: &ReplyView, viewer: Option<UserId>) -> Self {
        Self {
            id: view.reply.id,
            content: view.reply.content.clone(),
            author: view.author.to_string(),
            posted: format_time(view.reply.reply_post_time),
            can_delete: viewer.is_some_and(|id| view.is_author(id)),
        }
    }
}

/// Thread as shown on its own page.
#[derive(Debug, Clone)]
pub struct ThreadView {
    pub id: ThreadId,
    pub title: String,
    pub content: String,
    pub author: String,
    pub posted: String,
    pub edited: Option<String>,
    /// Whether the viewer wrote this thread.
    pub can_modify: bool,
    pub replies: Vec<ReplyItem>,
}

impl ThreadView {
    fn new(detail: &ThreadDetail, viewer: Option<UserId>) -> Self {
        Self {
            id: detail.thread.id,
            title: detail.thread.title.clone(),
            content: detail.thread.content.clone(),
            author: detail.author.to_string(),
            posted: format_time(detail.thread.post_time),
            edited: detail
                .was_edited()
                .then(|| format_time(detail.thread.last_edit_time)),
            can_modify: viewer.is_some_and(|id| detail.is_author(id)),
            replies: detail
                .replies
                .iter()
                .map(|reply| ReplyItem::new(reply, viewer))
                .collect(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Thread list page template.
#[derive(Template, WebTemplate)]
#[template(path = "threads/index.html")]
pub struct ThreadsIndexTemplate {
    pub ctx: PageContext,
    pub threads: Vec<ThreadListItem>,
}

/// New thread form template.
#[derive(Template, WebTemplate)]
#[template(path = "threads/new.html")]
pub struct NewThreadTemplate {
    pub ctx: PageContext,
}

/// Thread detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "threads/show.html")]
pub struct ThreadShowTemplate {
    pub ctx: PageContext,
    pub thread: ThreadView,
}

/// Edit thread form template.
#[derive(Template, WebTemplate)]
#[template(path = "threads/edit.html")]
pub struct EditThreadTemplate {
    pub ctx: PageContext,
    pub id: ThreadId,
    pub title: String,
    pub content: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display all threads, most recently active first.
#[instrument(skip(state, ctx))]
pub async fn index(State(state): State<AppState>, ctx: PageContext) -> Result<impl IntoResponse> {
    let threads = ForumService::new(state.threads())
        .list_threads()
        .await?
        .iter()
        .map(ThreadListItem::from)
        .collect();

    Ok(ThreadsIndexTemplate { ctx, threads })
}

/// Display the new thread form.
pub async fn new_form(RequireAuth(_user): RequireAuth, ctx: PageContext) -> impl IntoResponse {
    NewThreadTemplate { ctx }
}

/// Handle new thread submission.
#[instrument(skip(user, state, payload), fields(user_id = %user.id))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    FormBody(payload): FormBody<ThreadPayload>,
) -> Result<Response> {
    let input = state.validator().thread(&payload)?;
    let id = ForumService::new(state.threads())
        .create_thread(user.id, &input)
        .await?;

    forum_breadcrumb("Created thread", id, None);

    Ok((
        Flash::success("Successfully made a new thread."),
        Redirect::to(&format!("/threads/{id}")),
    )
        .into_response())
}

/// Display a thread with its replies.
#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    IdPath(id): IdPath<ThreadId>,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let detail = ForumService::new(state.threads()).thread_detail(id).await?;
    let viewer = ctx.current_user.as_ref().map(|user| user.id);
    let thread = ThreadView::new(&detail, viewer);

    Ok(ThreadShowTemplate { ctx, thread })
}

/// Display the edit form for the author.
#[instrument(skip(user, state, ctx), fields(user_id = %user.id))]
pub async fn edit_form(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    IdPath(id): IdPath<ThreadId>,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let thread = authorize_thread_owner(state.threads(), &user, id).await?;

    Ok(EditThreadTemplate {
        ctx,
        id: thread.id,
        title: thread.title,
        content: thread.content,
    })
}

/// Handle thread edit submission.
#[instrument(skip(user, state, payload), fields(user_id = %user.id))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    IdPath(id): IdPath<ThreadId>,
    FormBody(payload): FormBody<ThreadPayload>,
) -> Result<Response> {
    let input = state.validator().thread(&payload)?;
    let thread = authorize_thread_owner(state.threads(), &user, id).await?;
    ForumService::new(state.threads())
        .update_thread(&thread, &input)
        .await?;

    forum_breadcrumb("Edited thread", id, None);

    Ok((
        Flash::success("Successfully edited the thread."),
        Redirect::to(&format!("/threads/{id}")),
    )
        .into_response())
}

/// Delete a thread and every reply in it.
#[instrument(skip(user, state), fields(user_id = %user.id))]
pub async fn delete(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    IdPath(id): IdPath<ThreadId>,
) -> Result<Response> {
    authorize_thread_owner(state.threads(), &user, id).await?;
    ForumService::new(state.threads()).delete_thread(id).await?;

    forum_breadcrumb("Deleted thread", id, None);

    Ok((
        Flash::success("Successfully deleted the thread."),
        Redirect::to("/threads"),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(EXCERPT_CHARS + 5);
        let short = excerpt(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), EXCERPT_CHARS + 3);

        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_format_time() {
        let time = DateTime::parse_from_rfc3339("2024-03-05T09:07:00Z")
            .map(|t| t.with_timezone(&Utc));
        assert_eq!(time.map(format_time).ok().as_deref(), Some("Mar 5, 2024 09:07 UTC"));
    }
}
