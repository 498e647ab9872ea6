use axum::{middleware, Router};

use crate::{auth::require_auth, state::AppState};

pub mod handlers;

pub fn router(state: AppState) -> Router<AppState> {
    handlers::favorites_routes().route_layer(middleware::from_fn_with_state(state, require_auth))
}
