use axum::response::Json;
use serde_json::{json, Value};

/// Liveness check; no auth, no database access.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "mentortrack",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
