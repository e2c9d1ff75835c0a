//! GET /health: liveness check.

use axum::Json;
use serde_json::{Value, json};

/// Reports the binary version and the current server time.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
