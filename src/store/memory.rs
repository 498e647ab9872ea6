use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Favorite, FavoriteStore, NewFavorite, NewUser, ProfileUpdate, StoreError, User, UserStore,
};

/// Process-local stores with the same uniqueness rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    favorites: RwLock<Vec<Favorite>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn count_by_email(&self, email: &str) -> usize {
        self.users
            .read()
            .await
            .iter()
            .filter(|u| u.email == email)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation);
        }
        let row = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            name: None,
            avatar_url: None,
            college: None,
            branch: None,
            college_city: None,
            college_state: None,
            about: None,
            location: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        if let Some(email) = &update.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::UniqueViolation);
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        fn apply(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        apply(&mut user.name, update.name);
        apply(&mut user.avatar_url, update.avatar_url);
        apply(&mut user.college, update.college);
        apply(&mut user.branch, update.branch);
        apply(&mut user.college_city, update.college_city);
        apply(&mut user.college_state, update.college_state);
        apply(&mut user.about, update.about);
        apply(&mut user.location, update.location);

        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Favorite>, StoreError> {
        let favorites = self.favorites.read().await;
        Ok(favorites
            .iter()
            .rev()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_favorite(
        &self,
        user_id: Uuid,
        item_id: &str,
    ) -> Result<Option<Favorite>, StoreError> {
        let favorites = self.favorites.read().await;
        Ok(favorites
            .iter()
            .find(|f| f.user_id == user_id && f.item_id == item_id)
            .cloned())
    }

    async fn add_favorite(&self, favorite: NewFavorite) -> Result<Favorite, StoreError> {
        let mut favorites = self.favorites.write().await;
        if favorites
            .iter()
            .any(|f| f.user_id == favorite.user_id && f.item_id == favorite.item_id)
        {
            return Err(StoreError::UniqueViolation);
        }
        let row = Favorite {
            id: Uuid::new_v4(),
            user_id: favorite.user_id,
            item_id: favorite.item_id,
            item_type: favorite.item_type,
            created_at: OffsetDateTime::now_utc(),
        };
        favorites.push(row.clone());
        Ok(row)
    }

    async fn remove_favorite(&self, user_id: Uuid, item_id: &str) -> Result<bool, StoreError> {
        let mut favorites = self.favorites.write().await;
        let before = favorites.len();
        favorites.retain(|f| !(f.user_id == user_id && f.item_id == item_id));
        Ok(favorites.len() != before)
    }
}
