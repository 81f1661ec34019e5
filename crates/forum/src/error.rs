//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return `Result<T, AppError>`.
//!
//! Missing resources and permission failures are not error pages: they
//! redirect with a flash message, the way the rest of the forum reports
//! outcomes.

use std::fmt;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::rejection::{FormRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use coding_gurus_core::{ReplyId, ThreadId};

use crate::db::RepositoryError;
use crate::filters;
use crate::middleware::{Flash, PageContext};
use crate::models::CurrentUser;
use crate::services::auth::AuthError;
use crate::services::forum::ForumError;
use crate::validation::ValidationError;

/// Flash shown when the principal does not own the resource.
pub const PERMISSION_DENIED: &str = "You do not have permission to do that!";

/// Message for server-side failures. Details stay in the logs.
pub const GENERIC_ERROR: &str = "Something went wrong!";

/// A kind of forum content that can be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Thread,
    Reply,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thread => f.write_str("Thread"),
            Self::Reply => f.write_str("Reply"),
        }
    }
}

/// Error page template, used for 4xx and 5xx responses.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub ctx: PageContext,
    pub status: u16,
    pub message: String,
}

impl ErrorTemplate {
    /// Render an error page with the given status.
    #[must_use]
    pub fn respond(ctx: PageContext, status: StatusCode, message: impl Into<String>) -> Response {
        let page = Self {
            ctx,
            status: status.as_u16(),
            message: message.into(),
        };
        (status, page).into_response()
    }
}

/// An error page produced outside any handler context.
///
/// `AppError` has no access to the request, so it renders for an anonymous
/// visitor and attaches this marker. [`crate::middleware::flash_middleware`]
/// renders the page again with the request's [`PageContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub message: String,
}

impl ErrorPage {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Render for the given page context.
    #[must_use]
    pub fn render(self, ctx: PageContext) -> Response {
        ErrorTemplate::respond(ctx, self.status, self.message)
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        let mut response = self.clone().render(PageContext::default());
        response.extensions_mut().insert(self);
        response
    }
}

/// Application-level error type for the forum.
#[derive(Debug, Error)]
pub enum AppError {
    /// A submitted form failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The request body could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A thread or reply does not exist.
    #[error("{0} not found")]
    NotFound(Resource),

    /// No route matches, or a path parameter is malformed.
    #[error("Page not found")]
    PageNotFound,

    /// The principal does not own the resource.
    #[error("Forbidden")]
    Forbidden {
        /// Page to send the user back to.
        redirect_to: String,
    },

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Session(_) => true,
            Self::Auth(err) => err.is_server_error(),
            _ => false,
        }
    }
}

impl From<ForumError> for AppError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::NotFound(resource) => Self::NotFound(resource),
            ForumError::Forbidden { thread_id } => Self::Forbidden {
                redirect_to: format!("/threads/{thread_id}"),
            },
            ForumError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "Malformed path parameter");
        Self::PageNotFound
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let page = match self {
            Self::NotFound(resource) => {
                return (
                    Flash::error(format!("{resource} not found!")),
                    Redirect::to("/threads"),
                )
                    .into_response();
            }
            Self::Forbidden { redirect_to } => {
                return (Flash::error(PERMISSION_DENIED), Redirect::to(&redirect_to))
                    .into_response();
            }
            Self::Validation(err) => ErrorPage::new(StatusCode::BAD_REQUEST, err.to_string()),
            Self::BadRequest(msg) => ErrorPage::new(StatusCode::BAD_REQUEST, msg),
            Self::PageNotFound => ErrorPage::new(StatusCode::NOT_FOUND, "Page not found!"),
            Self::Auth(err) => {
                let status = err.status_code();
                if status.is_server_error() {
                    ErrorPage::new(status, GENERIC_ERROR)
                } else {
                    ErrorPage::new(status, err.user_message())
                }
            }
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Session(_) => {
                ErrorPage::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR)
            }
        };

        page.into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Attach (or with `None`, detach) the signed-in user to Sentry events.
pub fn set_sentry_user(user: Option<&CurrentUser>) {
    let user = user.map(|user| sentry::User {
        id: Some(user.id.to_string()),
        username: Some(user.username.to_string()),
        ..Default::default()
    });
    sentry::configure_scope(|scope| scope.set_user(user));
}

/// Record a forum write as a Sentry breadcrumb.
pub fn forum_breadcrumb(action: &str, thread_id: ThreadId, reply_id: Option<ReplyId>) {
    let mut data = sentry::protocol::Map::new();
    data.insert("thread_id".to_owned(), serde_json::Value::from(thread_id.as_i32()));
    if let Some(reply_id) = reply_id {
        data.insert("reply_id".to_owned(), serde_json::Value::from(reply_id.as_i32()));
    }

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some("forum".to_owned()),
        message: Some(action.to_owned()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}

#[cfg(test)]
mod tests {
    use axum::http::header::LOCATION;

    use super::*;
    use crate::middleware::FlashKind;

    fn location(response: &Response) -> Option<&str> {
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(AppError::NotFound(Resource::Thread).to_string(), "Thread not found");
        assert_eq!(
            AppError::BadRequest("invalid input".to_string()).to_string(),
            "Bad request: invalid input"
        );
    }

    #[test]
    fn test_not_found_redirects_with_flash() {
        let response = AppError::NotFound(Resource::Reply).into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/threads"));

        let flash = response.extensions().get::<Flash>().cloned();
        assert_eq!(
            flash,
            Some(Flash {
                kind: FlashKind::Error,
                message: "Reply not found!".to_string(),
            })
        );
    }

    #[test]
    fn test_forbidden_redirects_to_resource() {
        let response = AppError::from(ForumError::Forbidden {
            thread_id: coding_gurus_core::ThreadId::new(7),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/threads/7"));
        assert_eq!(
            response.extensions().get::<Flash>().map(|f| f.message.as_str()),
            Some(PERMISSION_DENIED)
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(get_status(AppError::PageNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_pages_carry_marker_for_rerender() {
        let response = AppError::BadRequest("Markup is not allowed".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.extensions().get::<ErrorPage>(),
            Some(&ErrorPage {
                status: StatusCode::BAD_REQUEST,
                message: "Markup is not allowed".to_string(),
            })
        );

        let redirect = AppError::NotFound(Resource::Thread).into_response();
        assert!(redirect.extensions().get::<ErrorPage>().is_none());
    }
}
