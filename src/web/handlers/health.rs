//! Liveness probe, exempt from auth and rate limiting (§4.4 bypass list).

use axum::Json;
use serde_json::{json, Value};

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
