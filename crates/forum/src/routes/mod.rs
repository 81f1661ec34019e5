//! HTTP route handlers for the forum.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                                 - Landing page
//!
//! # Threads
//! GET    /threads                          - Thread list, most recently active first
//! GET    /threads/new                      - New thread form (auth)
//! POST   /threads                          - Create thread (auth)
//! GET    /threads/{id}                     - Thread with replies
//! GET    /threads/{id}/edit                - Edit form (author)
//! PUT    /threads/{id}                     - Update thread (author)
//! DELETE /threads/{id}                     - Delete thread and its replies (author)
//!
//! # Replies
//! POST   /threads/{id}/replies             - Reply to a thread (auth)
//! DELETE /threads/{id}/replies/{reply_id}  - Delete reply (reply author)
//!
//! # Auth
//! GET    /register                         - Registration page (guest)
//! POST   /register                         - Register action (guest)
//! GET    /login                            - Login page (guest)
//! POST   /login                            - Login action (guest)
//! GET    /logout                           - Logout action (auth)
//! ```
//!
//! `PUT` and `DELETE` arrive as `POST ...?_method=...` from HTML forms and are
//! rewritten by [`crate::middleware::method_override`] before routing.

pub mod auth;
pub mod home;
pub mod replies;
pub mod threads;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    http::StatusCode,
    response::Response,
    routing::{delete, get, post},
};

use crate::error::{AppError, ErrorTemplate};
use crate::middleware::PageContext;
use crate::state::AppState;

/// Path parameters whose rejection renders the 404 page.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct IdPath<T>(pub T);

/// Form body whose rejection renders the 400 page.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct FormBody<T>(pub T);

/// Fallback for unmatched routes and unsupported methods.
pub async fn not_found(ctx: PageContext) -> Response {
    ErrorTemplate::respond(ctx, StatusCode::NOT_FOUND, "Page not found!")
}

/// Create the thread and reply routes router.
pub fn thread_routes() -> Router<AppState> {
    Router::new()
        .route("/threads", get(threads::index).post(threads::create))
        .route("/threads/new", get(threads::new_form))
        .route(
            "/threads/{id}",
            get(threads::show)
                .put(threads::update)
                .delete(threads::delete),
        )
        .route("/threads/{id}/edit", get(threads::edit_form))
        .route("/threads/{id}/replies", post(replies::create))
        .route("/threads/{id}/replies/{reply_id}", delete(replies::delete))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
}

/// Create all routes for the forum.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(thread_routes())
        .merge(auth_routes())
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
}
