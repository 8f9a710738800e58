use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Returns a simple status object with a server-side timestamp.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
