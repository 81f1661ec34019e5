//! Authentication route handlers.
//!
//! Handles registration, login and logout with username/password
//! credentials. Failures the user can fix are reported with a flash on the
//! form page; server failures fall through to [`AppError`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::FormBody;
use crate::error::{AppError, Result, set_sentry_user};
use crate::filters;
use crate::middleware::auth::DEFAULT_LANDING;
use crate::middleware::{
    Flash, GuestOnly, PageContext, RequireAuth, clear_current_user, set_current_user,
    take_return_to,
};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService, MIN_PASSWORD_LENGTH};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub username: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub min_password_length: usize,
}

/// Report a user-fixable auth failure on `page`, or escalate a server one.
fn reject(err: AuthError, page: &str) -> Result<Response> {
    if err.is_server_error() {
        return Err(AppError::Auth(err));
    }
    tracing::info!(error = %err, "Auth form rejected");
    Ok((Flash::error(err.user_message()), Redirect::to(page)).into_response())
}

/// Mark the session as belonging to `user`, under a fresh session id.
async fn sign_in(session: &Session, user: &User) -> Result<()> {
    session.cycle_id().await?;
    let principal = CurrentUser::from(user);
    set_current_user(session, &principal).await?;
    set_sentry_user(Some(&principal));
    Ok(())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(_guest: GuestOnly, ctx: PageContext) -> impl IntoResponse {
    RegisterTemplate {
        ctx,
        min_password_length: MIN_PASSWORD_LENGTH,
    }
}

/// Handle registration form submission.
#[instrument(skip(_guest, state, session, form), fields(username = %form.username))]
pub async fn register(
    _guest: GuestOnly,
    State(state): State<AppState>,
    session: Session,
    FormBody(form): FormBody<RegisterForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.users());
    let user = match auth.register(&form.email, &form.username, &form.password).await {
        Ok(user) => user,
        Err(e) => return reject(e, "/register"),
    };

    sign_in(&session, &user).await?;

    Ok((
        Flash::success("Welcome to Coding Gurus!"),
        Redirect::to(DEFAULT_LANDING),
    )
        .into_response())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(_guest: GuestOnly, ctx: PageContext) -> impl IntoResponse {
    LoginTemplate { ctx }
}

/// Handle login form submission.
///
/// Sends the user to the page they were turned away from, once.
#[instrument(skip(_guest, state, session, form), fields(username = %form.username))]
pub async fn login(
    _guest: GuestOnly,
    State(state): State<AppState>,
    session: Session,
    FormBody(form): FormBody<LoginForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.users());
    let user = match auth.login(&form.username, &form.password).await {
        Ok(user) => user,
        Err(e) => return reject(e, "/login"),
    };

    let target = take_return_to(&session).await?;
    sign_in(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    let target = target.unwrap_or_else(|| DEFAULT_LANDING.to_string());
    Ok((Flash::success("Welcome back!"), Redirect::to(&target)).into_response())
}

/// Log out and start a fresh anonymous session.
#[instrument(skip(user, session), fields(user_id = %user.id))]
pub async fn logout(RequireAuth(user): RequireAuth, session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    session.cycle_id().await?;
    set_sentry_user(None);
    tracing::info!("User logged out");

    Ok((Flash::success("Goodbye!"), Redirect::to(DEFAULT_LANDING)).into_response())
}
