pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::planning::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/batches", post(handlers::handle_plan_batch))
        .route("/api/v1/style-flags", get(handlers::handle_list_style_flags))
        .with_state(state)
}
