use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{
    Favorite, FavoriteStore, NewFavorite, NewUser, ProfileUpdate, StoreError, User, UserStore,
};
use crate::config::DatabaseConfig;

const USER_COLUMNS: &str = "id, username, email, password_hash, name, avatar_url, college, \
     branch, college_city, college_state, about, location, created_at";

/// Postgres-backed stores sharing one bounded pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
            .connect(&cfg.url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name          = COALESCE($1, name),
                email         = COALESCE($2, email),
                avatar_url    = COALESCE($3, avatar_url),
                college       = COALESCE($4, college),
                branch        = COALESCE($5, branch),
                college_city  = COALESCE($6, college_city),
                college_state = COALESCE($7, college_state),
                about         = COALESCE($8, about),
                location      = COALESCE($9, location)
            WHERE id = $10
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(update.name)
        .bind(update.email)
        .bind(update.avatar_url)
        .bind(update.college)
        .bind(update.branch)
        .bind(update.college_city)
        .bind(update.college_state)
        .bind(update.about)
        .bind(update.location)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[async_trait]
impl FavoriteStore for PgStore {
    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<Favorite>, StoreError> {
        let rows = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT id, user_id, item_id, item_type, created_at
              FROM favorites
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_favorite(
        &self,
        user_id: Uuid,
        item_id: &str,
    ) -> Result<Option<Favorite>, StoreError> {
        let row = sqlx::query_as::<_, Favorite>(
            r#"
            SELECT id, user_id, item_id, item_type, created_at
              FROM favorites
             WHERE user_id = $1 AND item_id = $2
            "#,
        )
        .bind(user_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn add_favorite(&self, favorite: NewFavorite) -> Result<Favorite, StoreError> {
        let row = sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO favorites (user_id, item_id, item_type)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, item_id, item_type, created_at
            "#,
        )
        .bind(favorite.user_id)
        .bind(&favorite.item_id)
        .bind(&favorite.item_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn remove_favorite(&self, user_id: Uuid, item_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND item_id = $2")
            .bind(user_id)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
