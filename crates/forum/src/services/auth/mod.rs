//! Registration and username/password login.

mod error;
mod password;

pub use error::AuthError;
pub use password::MIN_PASSWORD_LENGTH;

use coding_gurus_core::{Email, Username};

use crate::db::{RepositoryError, UserRepository};
use crate::models::User;

pub struct AuthService<'a> {
    users: &'a dyn UserRepository,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(users: &'a dyn UserRepository) -> Self {
        Self { users }
    }

    /// Create an account. The email is stored lowercased; the username as
    /// typed, minus surrounding whitespace.
    ///
    /// # Errors
    ///
    /// `InvalidEmail`, `InvalidUsername` or `WeakPassword` for bad input,
    /// `UserAlreadyExists` naming the field that collided.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let username = Username::parse(username)?;
        let phc = password::hash_new(password)?;

        let user = match self.users.create(&email, &username, &phc).await {
            Ok(user) => user,
            Err(RepositoryError::Conflict(field)) => {
                tracing::info!(field = %field, "Registration collided with existing user");
                return Err(AuthError::UserAlreadyExists(field));
            }
            Err(other) => return Err(other.into()),
        };

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check a username and password.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` whether the user is unknown or the password is
    /// wrong; the caller cannot tell which, by result or by timing.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        // A malformed username cannot belong to anyone
        let Ok(username) = Username::parse(username) else {
            password::verify_dummy(password);
            return Err(AuthError::InvalidCredentials);
        };

        match self.users.get_credentials_by_username(&username).await? {
            Some((user, phc)) if password::matches(password, &phc) => Ok(user),
            Some(_) => Err(AuthError::InvalidCredentials),
            None => {
                // Unknown usernames pay for a hash check too
                password::verify_dummy(password);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryRepository;

    #[tokio::test]
    async fn test_register_then_login() {
        let repo = MemoryRepository::new();
        let auth = AuthService::new(&repo);

        let user = auth
            .register(" Ada@Example.com ", "ada", "analytical")
            .await
            .unwrap();
        assert_eq!(user.email.as_str(), "ada@example.com");

        let logged_in = auth.login("ada", "analytical").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let repo = MemoryRepository::new();
        let auth = AuthService::new(&repo);
        auth.register("ada@example.com", "ada", "analytical")
            .await
            .unwrap();

        let dup = auth
            .register("ADA@example.com", "lovelace", "analytical")
            .await;
        assert!(matches!(dup, Err(AuthError::UserAlreadyExists(f)) if f == "email"));

        let dup = auth.register("other@example.com", "ada", "analytical").await;
        assert!(matches!(dup, Err(AuthError::UserAlreadyExists(f)) if f == "username"));

        let bad = auth.register("not-an-email", "babbage", "analytical").await;
        assert!(matches!(bad, Err(AuthError::InvalidEmail(_))));

        let weak = auth.register("c@example.com", "babbage", "short").await;
        assert!(matches!(weak, Err(AuthError::WeakPassword { .. })));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let repo = MemoryRepository::new();
        let auth = AuthService::new(&repo);
        auth.register("ada@example.com", "ada", "analytical")
            .await
            .unwrap();

        for (username, password) in [("ada", "wrong-password"), ("nobody", "analytical"), ("<b>", "x")] {
            assert!(matches!(
                auth.login(username, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }
}
