use crate::state::AppState;
use axum::Router;

mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod services;

pub use claims::Claims;
pub use extractors::{require_auth, verify_headers, AuthUser};
pub use jwt::TokenKeys;
pub use password::Passwords;
pub use services::CredentialService;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
