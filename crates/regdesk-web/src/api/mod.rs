mod auth_handlers;
pub mod registrations;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/logout", post(auth_handlers::logout))
        .route("/auth/status", get(auth_handlers::status))
}

/// Public registration endpoint. Body size is bounded by the outer
/// request limit and the per-file check in the handler.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(registrations::register))
        .layer(DefaultBodyLimit::disable())
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/registrations", get(registrations::list))
        .route("/export", get(registrations::export))
        .route("/image", get(registrations::image))
}
