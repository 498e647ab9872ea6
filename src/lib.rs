//! Backend for the event-discovery app: account signup/login with stateless session tokens,
//! plus the profile and favorites routes that sit behind them.

pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod favorites;
pub mod profile;
pub mod state;
pub mod store;
