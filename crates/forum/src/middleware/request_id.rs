//! Per-request correlation id.
//!
//! The id is recorded on the `http_request` span, set as a Sentry tag and
//! echoed in the `x-request-id` response header.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Upstream ids longer than this are replaced.
const MAX_REQUEST_ID_LEN: usize = 128;

/// A proxy-supplied id, if it is short visible ASCII.
fn upstream_id(headers: &HeaderMap) -> Option<&str> {
    let id = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let printable = id.bytes().all(|b| b.is_ascii_graphic());
    (printable && !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN).then_some(id)
}

pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let id = upstream_id(request.headers())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

    tracing::Span::current().record("request_id", id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &id));

    let mut response = next.run(request).await;
    if let Ok(header) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(value) {
            map.insert(REQUEST_ID_HEADER, value);
        }
        map
    }

    #[test]
    fn test_upstream_id_is_reused() {
        let map = headers("abc-123");
        assert_eq!(upstream_id(&map), Some("abc-123"));
    }

    #[test]
    fn test_unusable_upstream_ids_are_ignored() {
        assert_eq!(upstream_id(&HeaderMap::new()), None);
        assert_eq!(upstream_id(&headers("")), None);
        assert_eq!(upstream_id(&headers("has space")), None);
        assert_eq!(upstream_id(&headers(&"x".repeat(MAX_REQUEST_ID_LEN + 1))), None);
    }
}
