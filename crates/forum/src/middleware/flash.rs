//! One-shot flash messages and the per-page context.
//!
//! Handlers and error responses attach a [`Flash`] to the response.
//! [`flash_middleware`] moves it into the session, and the next page that
//! extracts a [`PageContext`] takes it out again and renders it. Flashes
//! taken by a request that ends in a redirect are queued again, so they
//! survive to the page the redirect lands on.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponseParts, Response, ResponseParts},
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_sessions::Session;

use crate::error::ErrorPage;
use crate::models::{CurrentUser, session_keys};

/// Whether a flash reports success or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl fmt::Display for FlashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// A notice shown once, on the next rendered page.
///
/// Returned as part of a response tuple:
///
/// ```rust,ignore
/// (Flash::success("Goodbye!"), Redirect::to("/threads"))
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

impl IntoResponseParts for Flash {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.extensions_mut().insert(self);
        Ok(res)
    }
}

/// Queue flashes in the session, after any already waiting.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn push_flashes(
    session: &Session,
    flashes: impl IntoIterator<Item = Flash>,
) -> Result<(), tower_sessions::session::Error> {
    let mut flashes = flashes.into_iter().peekable();
    if flashes.peek().is_none() {
        return Ok(());
    }

    let mut queued: Vec<Flash> = session.get(session_keys::FLASH).await?.unwrap_or_default();
    queued.extend(flashes);
    session.insert(session_keys::FLASH, queued).await
}

/// Remove and return every queued flash.
pub async fn take_flashes(session: &Session) -> Vec<Flash> {
    match session.remove::<Vec<Flash>>(session_keys::FLASH).await {
        Ok(flashes) => flashes.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash messages");
            Vec::new()
        }
    }
}

async fn current_user(session: &Session) -> Option<CurrentUser> {
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Flashes a [`PageContext`] took during the current request.
///
/// When the page is never rendered they go back into the session.
#[derive(Clone, Default)]
struct TakenFlashes(Arc<Mutex<Vec<Flash>>>);

impl TakenFlashes {
    async fn record(&self, flashes: &[Flash]) {
        self.0.lock().await.extend_from_slice(flashes);
    }

    async fn drain(&self) -> Vec<Flash> {
        std::mem::take(&mut *self.0.lock().await)
    }
}

/// Persist a response's [`Flash`] into the session.
///
/// Also finishes two cases a handler cannot see:
///
/// - An [`ErrorPage`] is rendered again with the principal and every pending
///   flash.
/// - A redirect puts back the flashes the handler took, ahead of its own.
///
/// Must run inside the session layer.
pub async fn flash_middleware(mut request: Request, next: Next) -> Response {
    let Some(session) = request.extensions().get::<Session>().cloned() else {
        let response = next.run(request).await;
        if let Some(flash) = response.extensions().get::<Flash>() {
            tracing::warn!(message = %flash.message, "Dropping flash without a session");
        }
        return response;
    };

    let taken = TakenFlashes::default();
    request.extensions_mut().insert(taken.clone());
    let mut response = next.run(request).await;

    let mut pending = taken.drain().await;
    let flash = response.extensions_mut().remove::<Flash>();

    if let Some(page) = response.extensions_mut().remove::<ErrorPage>() {
        pending.extend(take_flashes(&session).await);
        pending.extend(flash);
        let ctx = PageContext {
            current_user: current_user(&session).await,
            flashes: pending,
        };
        return page.render(ctx);
    }

    if !response.status().is_redirection() {
        pending.clear();
    }
    pending.extend(flash);

    if let Err(e) = push_flashes(&session, pending).await {
        tracing::warn!(error = %e, "Failed to store flash messages");
    }

    response
}

/// What every page template needs: the principal for the navigation bar
/// and the flashes to display.
///
/// Extracting it consumes the queued flashes.
#[derive(Debug, Default)]
pub struct PageContext {
    pub current_user: Option<CurrentUser>,
    pub flashes: Vec<Flash>,
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };

        let current_user = current_user(session).await;
        let flashes = take_flashes(session).await;
        if let Some(taken) = parts.extensions.get::<TakenFlashes>() {
            taken.record(&flashes).await;
        }

        Ok(Self {
            current_user,
            flashes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::StatusCode,
        response::{IntoResponse, Redirect},
        routing::get,
    };
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::error::AppError;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    /// Run `router` under the flash middleware with `session` attached.
    async fn call(router: Router, session: &Session) -> Response {
        let app = router.layer(axum::middleware::from_fn(flash_middleware));
        let mut request = axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(session.clone());
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_flashes_are_taken_once_in_order() {
        let session = session();
        push_flashes(&session, [Flash::success("first")]).await.unwrap();
        push_flashes(&session, [Flash::error("second")]).await.unwrap();

        let flashes = take_flashes(&session).await;
        assert_eq!(flashes, vec![Flash::success("first"), Flash::error("second")]);
        assert!(take_flashes(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_redirect_puts_taken_flashes_back_first() {
        let session = session();
        push_flashes(&session, [Flash::success("Welcome back!")]).await.unwrap();

        let router = Router::new().route(
            "/",
            get(|_ctx: PageContext| async {
                (Flash::error("Denied"), Redirect::to("/threads"))
            }),
        );
        let response = call(router, &session).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            take_flashes(&session).await,
            vec![Flash::success("Welcome back!"), Flash::error("Denied")]
        );
    }

    #[tokio::test]
    async fn test_rendered_page_consumes_flashes() {
        let session = session();
        push_flashes(&session, [Flash::success("Shown")]).await.unwrap();

        let router = Router::new().route(
            "/",
            get(|ctx: PageContext| async move { ctx.flashes.len().to_string() }),
        );
        let response = call(router, &session).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(take_flashes(&session).await.is_empty());
    }

    #[tokio::test]
    async fn test_error_page_renders_for_signed_in_user() {
        let session = session();
        let user = CurrentUser {
            id: coding_gurus_core::UserId::new(1),
            username: coding_gurus_core::Username::parse("ada").unwrap(),
        };
        session.insert(session_keys::CURRENT_USER, user).await.unwrap();
        push_flashes(&session, [Flash::success("Queued")]).await.unwrap();

        let router = Router::new().route(
            "/",
            get(|| async { AppError::BadRequest("Nope".to_owned()).into_response() }),
        );
        let response = call(router, &session).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<ErrorPage>().is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Signed in as ada"));
        assert!(body.contains("Queued"));
        assert!(take_flashes(&session).await.is_empty());
    }

    #[test]
    fn test_flash_kind_display_matches_css_class() {
        assert_eq!(FlashKind::Success.to_string(), "success");
        assert_eq!(FlashKind::Error.to_string(), "error");
    }
}
