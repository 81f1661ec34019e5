//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::db::{PgThreadRepository, PgUserRepository, ThreadRepository, UserRepository};
use crate::validation::ContentValidator;

/// Application state shared across all handlers.
///
/// Cheap to clone. Holds the repositories and the content validator.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    users: Arc<dyn UserRepository>,
    threads: Arc<dyn ThreadRepository>,
    validator: ContentValidator,
}

impl AppState {
    /// Create application state backed by `PostgreSQL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the content validator fails to compile.
    pub fn new(pool: PgPool) -> Result<Self, regex::Error> {
        let users = Arc::new(PgUserRepository::new(pool.clone()));
        let threads = Arc::new(PgThreadRepository::new(pool));
        Self::from_parts(users, threads)
    }

    /// Create application state from explicit repositories.
    ///
    /// # Errors
    ///
    /// Returns an error if the content validator fails to compile.
    pub fn from_parts(
        users: Arc<dyn UserRepository>,
        threads: Arc<dyn ThreadRepository>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            inner: Arc::new(AppStateInner {
                users,
                threads,
                validator: ContentValidator::new()?,
            }),
        })
    }

    #[must_use]
    pub fn users(&self) -> &dyn UserRepository {
        self.inner.users.as_ref()
    }

    #[must_use]
    pub fn threads(&self) -> &dyn ThreadRepository {
        self.inner.threads.as_ref()
    }

    /// Get the content validator.
    #[must_use]
    pub fn validator(&self) -> &ContentValidator {
        &self.inner.validator
    }
}
