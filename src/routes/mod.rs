pub mod health;
pub mod mcq;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/mcq/generate", post(mcq::generate_mcqs))
        .route("/api/mcq/page", post(mcq::page_questions))
        .route("/api/mcq/export", post(mcq::export_questions))
        .with_state(state)
}
