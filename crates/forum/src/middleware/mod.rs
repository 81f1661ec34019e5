//! HTTP middleware stack for the forum.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Method override (`MapRequestLayer`, before routing)
//! 2. Sentry layers (capture errors)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Security headers
//! 6. Session layer (tower-sessions)
//! 7. Flash (persist response flashes, finish error pages)

pub mod auth;
pub mod flash;
pub mod method_override;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    GuestOnly, OptionalAuth, RequireAuth, clear_current_user, set_current_user, take_return_to,
};
pub use flash::{Flash, FlashKind, PageContext, flash_middleware};
pub use method_override::method_override;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer_with_store};
