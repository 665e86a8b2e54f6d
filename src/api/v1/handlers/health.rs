/*
 * Responsibility
 * - GET /health (liveness; also reports whether a submit is in flight)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    // try_lock: health checks never wait on the form
    let busy = state.form.try_lock().map(|f| f.is_busy()).ok();
    (StatusCode::OK, Json(json!({ "status": "ok", "busy": busy })))
}
