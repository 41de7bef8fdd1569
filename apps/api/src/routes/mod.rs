pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/interviews", get(handlers::handle_list_sessions))
        .route("/api/v1/interviews/start", post(handlers::handle_start))
        .route("/api/v1/interviews/:id", get(handlers::handle_get_session))
        .route(
            "/api/v1/interviews/:id/answer",
            post(handlers::handle_answer),
        )
        .with_state(state)
}
