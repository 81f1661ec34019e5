//! HTML form method override.
//!
//! Browsers can only submit `GET` and `POST`, so edit and delete forms post
//! to `...?_method=PUT` or `...?_method=DELETE`. The override has to happen
//! before routing, so it wraps the whole router as a
//! `tower::util::MapRequestLayer` instead of a `Router::layer`.

use axum::{extract::Request, http::Method};

/// Query parameter naming the intended method.
pub const METHOD_PARAM: &str = "_method";

/// Rewrite a `POST` carrying `_method=PUT|PATCH|DELETE` to that method.
///
/// Any other request passes through untouched.
pub fn method_override(mut request: Request) -> Request {
    if request.method() != Method::POST {
        return request;
    }

    let Some(query) = request.uri().query() else {
        return request;
    };

    let requested = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == METHOD_PARAM)
        .and_then(|(_, value)| match value.to_ascii_uppercase().as_str() {
            "PUT" => Some(Method::PUT),
            "PATCH" => Some(Method::PATCH),
            "DELETE" => Some(Method::DELETE),
            _ => None,
        });

    if let Some(method) = requested {
        tracing::trace!(%method, "Method override");
        *request.method_mut() = method;
    }

    request
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(method: Method, uri: &str) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_post_with_override_is_rewritten() {
        let req = method_override(request(Method::POST, "/threads/1?_method=PUT"));
        assert_eq!(req.method(), Method::PUT);

        let req = method_override(request(Method::POST, "/threads/1?_method=delete"));
        assert_eq!(req.method(), Method::DELETE);
    }

    #[test]
    fn test_get_is_never_rewritten() {
        let req = method_override(request(Method::GET, "/threads/1?_method=DELETE"));
        assert_eq!(req.method(), Method::GET);
    }

    #[test]
    fn test_unknown_override_is_ignored() {
        let req = method_override(request(Method::POST, "/threads?_method=CONNECT"));
        assert_eq!(req.method(), Method::POST);

        let req = method_override(request(Method::POST, "/threads"));
        assert_eq!(req.method(), Method::POST);
    }
}
