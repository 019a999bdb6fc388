pub mod auth;
pub mod consumption;

use axum::routing::{get, post};
use axum::{Json, Router};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/health", get(auth::health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/consumption", post(consumption::create).get(consumption::list))
        .route("/api/consumption/health", get(consumption::health))
        .route("/api/consumption/analytics", get(consumption::analytics))
        .route("/api/consumption/dashboard", get(consumption::dashboard))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "consumption-backend" }))
}
