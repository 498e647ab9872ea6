use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, SignupRequest},
        services::CredentialService,
    },
    errors::AppError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
}

/// Unreadable bodies are reported like missing fields, as `{"error": ..}`.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected request body");
        AppError::missing_fields()
    })
}

#[instrument(skip(auth, payload))]
pub async fn signup(
    State(auth): State<CredentialService>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let res = auth.signup(json_body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(res)))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<CredentialService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let res = auth.login(json_body(payload)?).await?;
    Ok(Json(res))
}
