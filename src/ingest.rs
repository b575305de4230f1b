//! Ingestion pipeline (C6): schema validation, per-event derivation,
//! fingerprinting, and bulk persistence for `POST /api/log`.

use crate::constants::limits;
use crate::database::{NewLogRow, TenantRecord};
use crate::errors::{AppError, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use uuid::Uuid;

const LEVELS: [&str; 5] = ["debug", "info", "warn", "error", "fatal"];

#[derive(Debug, Deserialize)]
pub struct LogEvent {
    pub ts: Option<DateTime<Utc>>,
    pub level: String,
    pub message: String,
    pub source: Option<String>,
    pub env: Option<String>,
    pub ctx: Option<serde_json::Value>,
    pub user_id: Option<String>,
    pub request_id: Option<String>,
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub events: Vec<LogEvent>,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub received: usize,
    pub processed: u64,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

/// Materialise an already-size-checked batch into rows ready for
/// `bulk_insert_logs`. `received_at` is the server wall-clock moment the
/// batch arrived — it drives `day_id` and any event missing its own `ts`.
/// Validation failure surfaces as a single error naming the first
/// offending event (§4.5).
pub fn build_rows(
    tenant: &TenantRecord,
    events: &[LogEvent],
    received_at: DateTime<Utc>,
) -> Result<Vec<NewLogRow>, AppError> {
    let day_id = day_id_for(received_at);
    let mut rows = Vec::with_capacity(events.len());

    for (index, event) in events.iter().enumerate() {
        let row = build_row(tenant, event, received_at, day_id)
            .map_err(|detail| ValidationError::InvalidEventData(format!("event[{index}]: {detail}")))?;
        rows.push(row);
    }

    Ok(rows)
}

/// Reject a batch before any per-event work if it's outside the
/// deployer-configured bounds.
pub fn validate_batch_size(events_len: usize, max_events_per_post: usize) -> Result<(), AppError> {
    if events_len == 0 || events_len > max_events_per_post {
        return Err(ValidationError::TooManyEvents.into());
    }
    Ok(())
}

fn build_row(
    tenant: &TenantRecord,
    event: &LogEvent,
    received_at: DateTime<Utc>,
    day_id: i64,
) -> Result<NewLogRow, String> {
    let level = event.level.to_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return Err(format!("level must be one of {LEVELS:?}, got {:?}", event.level));
    }

    let message = event.message.trim();
    if message.is_empty() {
        return Err("message must not be empty".to_string());
    }
    let message = truncate(message, limits::MAX_MESSAGE_CHARS);

    let ts = event.ts.unwrap_or(received_at);

    let source = truncate(event.source.as_deref().unwrap_or(&tenant.slug), limits::MAX_SOURCE_CHARS);
    let env = truncate(event.env.as_deref().unwrap_or("production"), limits::MAX_ENV_CHARS);
    let user_id = event
        .user_id
        .as_deref()
        .map(|v| truncate(v, limits::MAX_USER_ID_CHARS));
    let request_id = event
        .request_id
        .as_deref()
        .map(|v| truncate(v, limits::MAX_REQUEST_ID_CHARS));
    let tags = event.tags.as_deref().map(|v| truncate(v, limits::MAX_TAGS_CHARS));

    let ctx_json = match &event.ctx {
        Some(value) => Some(serde_json::to_string(value).map_err(|e| format!("ctx is not valid JSON: {e}"))?),
        None => None,
    };
    let stack = event
        .ctx
        .as_ref()
        .and_then(|v| v.get("stack"))
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let fingerprint = fingerprint(&message, event.source.as_deref().unwrap_or(""), stack);

    Ok(NewLogRow {
        project_id: tenant.id,
        ts,
        level,
        message,
        source,
        env,
        ctx_json,
        user_id,
        request_id,
        tags,
        fingerprint,
        day_id,
        created_at: received_at,
    })
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// `YYYYMMDD` for the server's wall-clock date at `at` (§3, §9 — day_id
/// follows server time, not the client-supplied `ts`).
fn day_id_for(at: DateTime<Utc>) -> i64 {
    let date: NaiveDate = at.date_naive();
    date.format("%Y%m%d").to_string().parse().expect("YYYYMMDD is always numeric")
}

/// First 16 hex chars of `SHA-1("<message>|<source>|<stack>")`. An absent
/// part contributes the empty string; the pipe separators are literal.
fn fingerprint(message: &str, source: &str, stack: &str) -> String {
    let material = format!("{message}|{source}|{stack}");
    let digest = Sha1::digest(material.as_bytes());
    hex::encode(digest)[..16].to_string()
}

pub fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tenant() -> TenantRecord {
        TenantRecord {
            id: 1,
            slug: "acme".to_string(),
            api_key_hash: "h".to_string(),
            retention_days: 3,
            minute_cap: 5000,
            default_sampling: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fingerprint_matches_the_documented_example() {
        // first16hex(SHA1("boom||")) per spec scenario 1.
        let fp = fingerprint("boom", "", "");
        assert_eq!(fp.len(), 16);
        let full = Sha1::digest(b"boom||");
        assert_eq!(fp, hex::encode(full)[..16]);
    }

    #[test]
    fn day_id_matches_created_at_date() {
        let at = Utc.with_ymd_and_hms(2026, 8, 1, 23, 59, 0).unwrap();
        assert_eq!(day_id_for(at), 20260801);
    }

    #[test]
    fn rejects_unknown_level() {
        let event = LogEvent {
            ts: None,
            level: "trace".to_string(),
            message: "hi".to_string(),
            source: None,
            env: None,
            ctx: None,
            user_id: None,
            request_id: None,
            tags: None,
        };
        let result = build_row(&tenant(), &event, Utc::now(), 20260801);
        assert!(result.is_err());
    }

    #[test]
    fn defaults_source_to_tenant_slug_and_env_to_production() {
        let event = LogEvent {
            ts: None,
            level: "error".to_string(),
            message: "boom".to_string(),
            source: None,
            env: None,
            ctx: None,
            user_id: None,
            request_id: None,
            tags: None,
        };
        let row = build_row(&tenant(), &event, Utc::now(), 20260801).unwrap();
        assert_eq!(row.source, "acme");
        assert_eq!(row.env, "production");
    }

    #[test]
    fn fingerprint_is_computed_over_the_raw_event_source_not_the_stored_default() {
        // The stored column defaults a missing source to the tenant slug,
        // but the fingerprint must still treat it as absent (§4.5 scenario 1).
        let event = LogEvent {
            ts: None,
            level: "error".to_string(),
            message: "boom".to_string(),
            source: None,
            env: None,
            ctx: None,
            user_id: None,
            request_id: None,
            tags: None,
        };
        let received_at = Utc::now();
        let rows = build_rows(&tenant(), std::slice::from_ref(&event), received_at).unwrap();
        let expected = hex::encode(Sha1::digest(b"boom||"))[..16].to_string();
        assert_eq!(rows[0].fingerprint, expected);
        assert_eq!(rows[0].source, "acme");
    }

    #[test]
    fn validate_batch_size_rejects_empty_and_oversized_batches() {
        assert!(validate_batch_size(0, 250).is_err());
        assert!(validate_batch_size(251, 250).is_err());
        assert!(validate_batch_size(250, 250).is_ok());
    }
}
