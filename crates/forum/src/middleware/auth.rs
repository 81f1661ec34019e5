//! Authentication extractors and session helpers.
//!
//! - [`RequireAuth`] rejects anonymous requests with a redirect to `/login`,
//!   remembering the page they asked for.
//! - [`OptionalAuth`] never rejects.
//! - [`GuestOnly`] sends signed-in users away from the login and
//!   registration pages.

use axum::{
    extract::FromRequestParts,
    http::{Method, StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::flash::Flash;
use crate::models::{CurrentUser, session_keys};

/// Flash shown when a protected page is requested anonymously.
pub const SIGN_IN_REQUIRED: &str = "You must be signed in first!";

/// Where users land after logging in, out, or registering.
pub const DEFAULT_LANDING: &str = "/threads";

/// Paths never remembered as a post-login destination.
const NEVER_RETURN_TO: &[&str] = &["/login", "/logout", "/register"];

/// Extractor that requires a logged-in user.
///
/// If the user is not logged in, a `GET` request's path is stashed as the
/// post-login destination and the user is redirected to `/login`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug)]
pub struct RequireAuth(pub CurrentUser);

/// Rejection from the authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to the login page with a flash.
    RedirectToLogin,
    /// Already signed in; redirect to the landing page.
    AlreadySignedIn,
    /// The session layer is missing or the store failed.
    SessionUnavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => {
                (Flash::error(SIGN_IN_REQUIRED), Redirect::to("/login")).into_response()
            }
            Self::AlreadySignedIn => Redirect::to(DEFAULT_LANDING).into_response(),
            Self::SessionUnavailable => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::SessionUnavailable)?;

        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to load session");
                AuthRejection::SessionUnavailable
            })?;

        if let Some(user) = user {
            return Ok(Self(user));
        }

        if parts.method == Method::GET {
            let target = parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
            if let Err(e) = stash_return_to(session, target).await {
                tracing::warn!(error = %e, "Failed to remember return-to page");
            }
        }

        Err(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if the user is not logged in.
#[derive(Debug)]
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Extractor for pages only anonymous visitors should see.
#[derive(Debug)]
pub struct GuestOnly;

impl<S> FromRequestParts<S> for GuestOnly
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(OptionalAuth(user)) = OptionalAuth::from_request_parts(parts, state).await;
        match user {
            Some(_) => Err(AuthRejection::AlreadySignedIn),
            None => Ok(Self),
        }
    }
}

/// Whether `target` is a same-site path that is safe to redirect to.
#[must_use]
pub fn is_safe_return_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.chars().any(char::is_control)
}

/// Remember where to send the user after they log in.
///
/// Unsafe targets and the auth pages themselves are ignored.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn stash_return_to(
    session: &Session,
    target: &str,
) -> Result<(), tower_sessions::session::Error> {
    let path = target.split('?').next().unwrap_or(target);
    if !is_safe_return_path(target) || NEVER_RETURN_TO.contains(&path) {
        return Ok(());
    }
    session.insert(session_keys::RETURN_TO, target).await
}

/// Take the remembered destination, leaving none behind.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn take_return_to(
    session: &Session,
) -> Result<Option<String>, tower_sessions::session::Error> {
    let target = session.remove::<String>(session_keys::RETURN_TO).await?;
    Ok(target.filter(|t| is_safe_return_path(t)))
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}
