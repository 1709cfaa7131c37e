use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "ok",
        "model": state.generation_service.settings().model_id,
        "search_enabled": state.search_enabled,
    });
    (StatusCode::OK, Json(body))
}
