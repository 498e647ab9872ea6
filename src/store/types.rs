use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt or argon2 PHC string
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub college: Option<String>,
    pub branch: Option<String>,
    pub college_city: Option<String>,
    pub college_state: Option<String>,
    pub about: Option<String>,
    pub location: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial profile edit; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "avatarUrl", alias = "avatar_url")]
    pub avatar_url: Option<String>,
    pub college: Option<String>,
    pub branch: Option<String>,
    pub college_city: Option<String>,
    pub college_state: Option<String>,
    pub about: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item_id: String,
    pub item_type: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub user_id: Uuid,
    pub item_id: String,
    pub item_type: String,
}
