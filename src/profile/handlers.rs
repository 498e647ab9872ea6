use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{handlers::json_body, AuthUser},
    errors::AppError,
    state::AppState,
    store::{ProfileUpdate, StoreError, User},
};

pub fn profile_routes() -> Router<AppState> {
    Router::new().route("/profile/:id", get(get_profile).put(update_profile))
}

/// Ids that are not UUIDs cannot name a user.
fn profile_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "unparseable profile id");
        AppError::NotFound("User not found")
    })
}

fn ensure_owner(caller: &AuthUser, id: Uuid) -> Result<(), AppError> {
    if caller.id() != id {
        warn!(caller = %caller.id(), target = %id, "profile access denied");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

#[instrument(skip(state, caller, path))]
pub async fn get_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<User>, AppError> {
    let id = profile_id(path)?;
    ensure_owner(&caller, id)?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;
    Ok(Json(user))
}

#[instrument(skip(state, caller, path, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    caller: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let id = profile_id(path)?;
    ensure_owner(&caller, id)?;
    let mut update = json_body(payload)?;
    // an emptied email would break login
    if update.email.as_deref().is_some_and(|e| e.trim().is_empty()) {
        return Err(AppError::missing_fields());
    }
    update.email = update.email.map(|e| e.trim().to_string());

    let user = state
        .users
        .update_profile(id, update)
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation => AppError::Conflict("Email already registered"),
            other => other.into(),
        })?
        .ok_or(AppError::NotFound("User not found"))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(user))
}
