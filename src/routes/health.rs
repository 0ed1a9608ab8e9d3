use axum::Json;
use std::time::{SystemTime, UNIX_EPOCH};

/// GET /
/// Liveness string for load balancers and the dashboard's smoke check.
pub async fn root() -> &'static str {
    "Social Media Analytics Microservice is running"
}

/// GET /health
/// Response: 200 OK with JSON
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
      "status": "healthy",
      "timestamp": SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }))
}
