pub mod cache;
pub mod client;
pub mod config;
pub mod dto;
pub mod errors;
pub mod ingest;
pub mod models;
pub mod routes;
pub mod scheduler;
pub mod states;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

use crate::states::AppState;

/// Build the HTTP surface over a prepared application state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/users", get(routes::users::top_users))
        .route("/posts", get(routes::posts::get_posts))
        .with_state(state)
        .layer(cors)
}
