//! Domain models for the forum.

pub mod reply;
pub mod session;
pub mod thread;
pub mod user;

pub use reply::{Reply, ReplyView};
pub use session::{CurrentUser, keys as session_keys};
pub use thread::{Thread, ThreadDetail, ThreadSummary};
pub use user::User;
