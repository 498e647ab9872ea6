use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    auth::{handlers::json_body, AuthUser},
    errors::AppError,
    state::AppState,
    store::{Favorite, NewFavorite, StoreError},
};

const DEFAULT_ITEM_TYPE: &str = "event";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(default)]
    pub item_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub fn favorites_routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(list_favorites).post(add_favorite))
        .route("/favorites/:item_id", delete(remove_favorite))
}

#[instrument(skip(state, caller))]
pub async fn list_favorites(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<Favorite>>, AppError> {
    let rows = state.favorites.list_favorites(caller.id()).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, caller, payload))]
pub async fn add_favorite(
    State(state): State<AppState>,
    caller: AuthUser,
    payload: Result<Json<AddFavoriteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Favorite>), AppError> {
    let body = json_body(payload)?;
    let item_id = body
        .item_id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("itemId is required".into()))?;
    let item_type = body
        .item_type
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ITEM_TYPE.to_string());

    let user_id = caller.id();
    if state
        .favorites
        .find_favorite(user_id, &item_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Already favorited"));
    }

    let row = state
        .favorites
        .add_favorite(NewFavorite {
            user_id,
            item_id,
            item_type,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation => AppError::Conflict("Already favorited"),
            other => other.into(),
        })?;

    info!(%user_id, item_id = %row.item_id, "favorite added");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, caller))]
pub async fn remove_favorite(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(item_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = caller.id();
    if !state.favorites.remove_favorite(user_id, &item_id).await? {
        return Err(AppError::NotFound("Favorite not found"));
    }
    info!(%user_id, %item_id, "favorite removed");
    Ok(Json(MessageResponse {
        message: "Favorite removed",
    }))
}
