//! User domain types.

use chrono::{DateTime, Utc};

use coding_gurus_core::{Email, UserId, Username};

/// A registered forum member.
///
/// The password hash never leaves the repository layer except through
/// `UserRepository::get_credentials_by_username`.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address.
    pub email: Email,
    /// Public handle shown on posts.
    pub username: Username,
    /// When the user registered.
    pub created_at: DateTime<Utc>,
}
