//! Smoke tests against a running forum.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`gurus-cli migrate`)
//! - The forum running (`cargo run -p coding-gurus-forum`)
//!
//! Run with: `cargo test -p coding-gurus-integration-tests -- --ignored`

use reqwest::{Client, StatusCode, redirect::Policy};

/// Base URL for the forum (configurable via environment).
fn forum_base_url() -> String {
    std::env::var("FORUM_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A client that keeps cookies and stops at redirects so they can be asserted.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Unique per run so repeated runs do not collide on registration.
fn unique_username() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("smoke_{nanos}")
}

#[tokio::test]
#[ignore = "Requires running forum server and database"]
async fn test_readiness() {
    let resp = client()
        .get(format!("{}/health/ready", forum_base_url()))
        .send()
        .await
        .expect("Failed to reach forum");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running forum server and database"]
async fn test_register_post_and_delete_thread() {
    let client = client();
    let base_url = forum_base_url();
    let username = unique_username();
    let email = format!("{username}@example.com");

    let resp = client
        .post(format!("{base_url}/register"))
        .form(&[
            ("email", email.as_str()),
            ("username", username.as_str()),
            ("password", "smoke-test-password"),
        ])
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .post(format!("{base_url}/threads"))
        .form(&[("thread[title]", "Smoke test"), ("thread[content]", "Hello")])
        .send()
        .await
        .expect("Failed to create thread");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("Missing location header")
        .to_string();

    let resp = client
        .post(format!("{base_url}{location}?_method=DELETE"))
        .send()
        .await
        .expect("Failed to delete thread");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let resp = client
        .get(format!("{base_url}{location}"))
        .send()
        .await
        .expect("Failed to load deleted thread");
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}
