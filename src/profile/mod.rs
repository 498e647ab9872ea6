use axum::{middleware, Router};

use crate::{auth::require_auth, state::AppState};

pub mod handlers;

/// Profile reads and edits; every route requires a session token.
pub fn router(state: AppState) -> Router<AppState> {
    handlers::profile_routes().route_layer(middleware::from_fn_with_state(state, require_auth))
}
