//! Integration tests for Coding Gurus.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database needed)
//! cargo test -p coding-gurus-integration-tests
//!
//! # Live-server tests (database migrated, forum running)
//! cargo test -p coding-gurus-integration-tests -- --ignored
//! ```
//!
//! [`TestApp`] builds the real router over the in-memory repositories and a
//! `MemoryStore` session store. Each [`TestClient`] keeps its own session
//! cookie, so one test can act as several users.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use coding_gurus_core::ThreadId;
use coding_gurus_forum::config::ForumConfig;
use coding_gurus_forum::db::memory::MemoryRepository;
use coding_gurus_forum::middleware::session::SESSION_COOKIE_NAME;
use coding_gurus_forum::middleware::session_layer_with_store;
use coding_gurus_forum::state::AppState;
use coding_gurus_forum::{App, build_app};

/// Password used by every test account.
pub const PASSWORD: &str = "hunter2hunter2";

/// The forum wired to in-memory storage.
pub struct TestApp {
    app: App,
    repo: Arc<MemoryRepository>,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let config = ForumConfig::for_tests();
        let repo = Arc::new(MemoryRepository::new());
        let state = AppState::from_parts(repo.clone(), repo.clone()).unwrap();
        let session_layer = session_layer_with_store(MemoryStore::default(), &config);

        Self {
            app: build_app(state, session_layer),
            repo,
        }
    }

    /// Direct access to storage, for assertions.
    #[must_use]
    pub fn repo(&self) -> &MemoryRepository {
        &self.repo
    }

    /// A client with an empty cookie jar.
    #[must_use]
    pub fn client(&self) -> TestClient {
        TestClient {
            app: self.app.clone(),
            cookie: None,
        }
    }

    /// A client signed in as a freshly registered `username`.
    pub async fn signed_in(&self, username: &str) -> TestClient {
        let mut client = self.client();
        let response = client.register(username).await;
        assert_eq!(response.location(), Some("/threads"), "registration failed");
        client
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Whether this is a `303 See Other` to `path`.
    #[must_use]
    pub fn redirects_to(&self, path: &str) -> bool {
        self.status == StatusCode::SEE_OTHER && self.location() == Some(path)
    }
}

/// One browser: sends requests through the router and carries the session
/// cookie between them.
pub struct TestClient {
    app: App,
    cookie: Option<String>,
}

impl TestClient {
    pub async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let mut request = request;
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.app.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            self.store_cookie(value.to_str().unwrap());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let pair = set_cookie.split(';').next().unwrap_or_default().trim();
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        if name != SESSION_COOKIE_NAME {
            return;
        }
        let expired = set_cookie.to_ascii_lowercase().contains("max-age=0");
        self.cookie = (!value.is_empty() && !expired).then(|| pair.to_string());
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Submit an urlencoded form, the way a browser would.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Follow a redirect with a `GET`.
    pub async fn follow(&mut self, response: &TestResponse) -> TestResponse {
        let location = response.location().expect("response is not a redirect");
        self.get(location).await
    }

    pub async fn register(&mut self, username: &str) -> TestResponse {
        let email = format!("{username}@example.com");
        self.post_form(
            "/register",
            &[
                ("email", email.as_str()),
                ("username", username),
                ("password", PASSWORD),
            ],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post_form("/login", &[("username", username), ("password", password)])
            .await
    }

    pub async fn logout(&mut self) -> TestResponse {
        self.get("/logout").await
    }

    /// Post a thread and return its id.
    pub async fn create_thread(&mut self, title: &str, content: &str) -> ThreadId {
        let response = self
            .post_form(
                "/threads",
                &[("thread[title]", title), ("thread[content]", content)],
            )
            .await;
        let location = response.location().expect("thread was not created");
        let id = location.trim_start_matches("/threads/").parse::<i32>().unwrap();
        ThreadId::new(id)
    }

    pub async fn reply(&mut self, thread: ThreadId, content: &str) -> TestResponse {
        self.post_form(
            &format!("/threads/{thread}/replies"),
            &[("reply[replyContent]", content)],
        )
        .await
    }
}
