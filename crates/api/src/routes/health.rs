use axum::Json;
use s3manager_domain::constants::APP_NAME;
use serde_json::{json, Value};

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": APP_NAME }))
}
