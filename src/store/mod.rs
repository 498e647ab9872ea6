//! Persistence collaborators consumed by the HTTP layer.
//!
//! Both Postgres and the in-memory backend implement the same traits, so handlers never know
//! which one is behind the `Arc<dyn ..>` held in [`AppState`](crate::state::AppState).

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

mod memory;
mod pg;
mod types;

pub use memory::MemoryStore;
pub use pg::PgStore;
pub use types::{Favorite, NewFavorite, NewUser, ProfileUpdate, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint (user email, favorite per user) rejected the write.
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation;
            }
        }
        StoreError::Database(e)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] when the email is already taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Applies the provided fields only; `None` when no such user exists.
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// Newest first.
    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Favorite>, StoreError>;

    async fn find_favorite(
        &self,
        user_id: Uuid,
        item_id: &str,
    ) -> Result<Option<Favorite>, StoreError>;

    async fn add_favorite(&self, favorite: NewFavorite) -> Result<Favorite, StoreError>;

    /// Returns whether a row was removed.
    async fn remove_favorite(&self, user_id: Uuid, item_id: &str) -> Result<bool, StoreError>;
}
