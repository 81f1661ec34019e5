//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] coding_gurus_core::EmailError),

    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] coding_gurus_core::UsernameError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email or username already registered. Holds the colliding field.
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    /// Password shorter than the minimum.
    #[error("password shorter than {min} characters")]
    WeakPassword { min: usize },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Whether this is the server's fault rather than the user's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Repository(_) | Self::PasswordHash)
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserAlreadyExists(_) => StatusCode::CONFLICT,
            Self::InvalidEmail(_) | Self::InvalidUsername(_) | Self::WeakPassword { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::Repository(_) | Self::PasswordHash => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the user in a flash.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCredentials => "Password or username is incorrect".to_string(),
            Self::UserAlreadyExists(field) => {
                format!("A user with the given {field} is already registered")
            }
            Self::InvalidEmail(e) => format!("Invalid email: {e}"),
            Self::InvalidUsername(e) => format!("Invalid username: {e}"),
            Self::WeakPassword { min } => format!("Password must be at least {min} characters"),
            Self::Repository(_) | Self::PasswordHash => "Something went wrong!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message_names_field() {
        let err = AuthError::UserAlreadyExists("email".to_string());
        assert_eq!(
            err.user_message(),
            "A user with the given email is already registered"
        );
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = AuthError::Repository(RepositoryError::DataCorruption("bad row".into()));
        assert!(err.is_server_error());
        assert!(!err.user_message().contains("bad row"));
    }
}
