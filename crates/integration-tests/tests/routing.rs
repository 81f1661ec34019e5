//! Fallbacks, health checks, static assets and response headers.

use axum::http::StatusCode;

use coding_gurus_integration_tests::TestApp;

#[tokio::test]
async fn test_unknown_route_renders_404_page() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/definitely/not/here").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("Page not found!"));
}

#[tokio::test]
async fn test_malformed_thread_id_renders_404_page() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/threads/not-a-number").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("Page not found!"));
}

#[tokio::test]
async fn test_unsupported_method_renders_404_page() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.post_form("/threads/1/edit", &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_method_override_is_ignored() {
    let app = TestApp::new();
    let mut ada = app.signed_in("ada").await;
    let id = ada.create_thread("t", "c").await;

    // POST /threads/{id} has no route, so the request falls through to 404
    let response = ada.post_form(&format!("/threads/{id}?_method=TRACE"), &[]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_landing_and_list_pages_render() {
    let app = TestApp::new();
    let mut client = app.client();

    let home = client.get("/").await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains("Coding Gurus"));

    let list = client.get("/threads").await;
    assert_eq!(list.status, StatusCode::OK);
    assert!(list.body.contains("All threads"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();
    let mut client = app.client();

    let live = client.get("/health").await;
    assert_eq!(live.status, StatusCode::OK);
    assert_eq!(live.body, "ok");

    assert_eq!(client.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_stylesheet_is_served() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/static/app.css").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(".flash"));
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let app = TestApp::new();
    let mut client = app.client();

    let page = client.get("/threads").await;
    assert_eq!(page.header("x-frame-options"), Some("DENY"));
    assert_eq!(page.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(page.header("cache-control"), Some("no-store"));
    assert!(page
        .header("content-security-policy")
        .is_some_and(|csp| csp.contains("style-src 'self'")));
    assert!(page.header("x-request-id").is_some_and(|id| !id.is_empty()));

    let css = client.get("/static/app.css").await;
    assert_ne!(css.header("cache-control"), Some("no-store"));
}

#[tokio::test]
async fn test_session_cookie_is_http_only() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.register("ada").await;
    let cookie = response.header("set-cookie").unwrap();
    assert!(cookie.starts_with("gurus_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
}
