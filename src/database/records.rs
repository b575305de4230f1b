//! Database record types (entities), mirroring the schema in `schema.rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRecord {
    pub id: i64,
    pub slug: String,
    pub api_key_hash: String,
    pub retention_days: i64,
    pub minute_cap: i64,
    pub default_sampling: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLog {
    pub id: i64,
    pub project_id: i64,
    pub ts: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub source: String,
    pub env: String,
    pub ctx_json: Option<String>,
    pub user_id: Option<String>,
    pub request_id: Option<String>,
    pub tags: Option<String>,
    pub fingerprint: String,
    pub day_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A row ready to be written; one per event in a batch, produced by the
/// ingestion pipeline (C6) before the bulk insert.
#[derive(Debug, Clone)]
pub struct NewLogRow {
    pub project_id: i64,
    pub ts: DateTime<Utc>,
    pub level: String,
    pub message: String,
    pub source: String,
    pub env: String,
    pub ctx_json: Option<String>,
    pub user_id: Option<String>,
    pub request_id: Option<String>,
    pub tags: Option<String>,
    pub fingerprint: String,
    pub day_id: i64,
    pub created_at: DateTime<Utc>,
}
