// Modified: 2026-03-14

//! Health check endpoint.

use axum::response::Json;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
        "service": "privguard-api",
        "version": privguard_core::VERSION,
    }))
}
