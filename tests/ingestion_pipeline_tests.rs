//! Integration tests exercising the ingest → store → query path and the
//! authenticator, end to end, against an in-memory store.

use chrono::Utc;
use logsink::auth;
use logsink::database::Store;
use logsink::ingest::{self, IngestRequest};
use logsink::rate_limit;
use sha1::Digest;

async fn test_store() -> Store {
    Store::connect("sqlite::memory:").await.expect("in-memory store connects")
}

#[tokio::test]
async fn round_trip_single_event() {
    let store = test_store().await;
    let tenant = store
        .create_tenant("acme", &auth::hash_api_key("plaintext-key"), 3, 5000)
        .await
        .unwrap();

    let body = br#"{"events":[{"level":"error","message":"boom"}]}"#;
    let request: IngestRequest = serde_json::from_slice(body).unwrap();

    ingest::validate_batch_size(request.events.len(), 250).unwrap();
    let rows = ingest::build_rows(&tenant, &request.events, Utc::now()).unwrap();
    let processed = store.bulk_insert_logs(&rows).await.unwrap();
    assert_eq!(processed, 1);

    let found = store.query_logs(tenant.id, 10, 0, Some("error"), None).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].message, "boom");
    assert_eq!(found[0].level, "error");
    assert_eq!(found[0].source, "acme");

    let expected_fingerprint =
        hex::encode(sha1::Sha1::digest(b"boom||"))[..16].to_string();
    assert_eq!(found[0].fingerprint, expected_fingerprint);
}

#[tokio::test]
async fn signature_mismatch_is_rejected_without_inserting_rows() {
    let store = test_store().await;
    let secret = "a".repeat(32);
    let body = br#"{"events":[{"level":"error","message":"boom"}]}"#;

    let valid_signature = auth::compute_signature(body, &secret);
    let tampered_body = br#"{"events":[{"level":"error","message":"boom"} ]}"#;

    assert!(!auth::verify_signature(tampered_body, &secret, &valid_signature));

    // No insert path is reachable without passing verification, so the
    // store is untouched; a plain row count confirms it.
    let tenant = store.create_tenant("acme", "hash", 3, 5000).await.unwrap();
    let found = store.query_logs(tenant.id, 10, 0, None, None).await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn batch_size_cap_is_enforced_before_any_row_is_built() {
    let result = ingest::validate_batch_size(251, 250);
    assert!(result.is_err());
}

#[tokio::test]
async fn address_rate_limit_trips_after_the_configured_cap() {
    let store = test_store().await;
    let cap = 3;
    for _ in 0..cap {
        rate_limit::check_tier(&store, "address", "203.0.113.5", cap).await.unwrap();
    }
    let result = rate_limit::check_tier(&store, "address", "203.0.113.5", cap).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn retention_purge_removes_only_rows_before_the_cutoff() {
    let store = test_store().await;
    let tenant = store.create_tenant("acme", "hash", 3, 5000).await.unwrap();

    let today = Utc::now().format("%Y%m%d").to_string().parse::<i64>().unwrap();
    let old_row = logsink::database::NewLogRow {
        project_id: tenant.id,
        ts: Utc::now(),
        level: "error".to_string(),
        message: "stale".to_string(),
        source: "s".to_string(),
        env: "production".to_string(),
        ctx_json: None,
        user_id: None,
        request_id: None,
        tags: None,
        fingerprint: "f1".to_string(),
        day_id: today - tenant.retention_days - 1,
        created_at: Utc::now(),
    };
    let fresh_row = logsink::database::NewLogRow {
        day_id: today,
        fingerprint: "f2".to_string(),
        message: "fresh".to_string(),
        ..old_row.clone()
    };
    store.bulk_insert_logs(&[old_row, fresh_row]).await.unwrap();

    let cutoff = today - tenant.retention_days;
    let purged = store.purge_logs_before_day(tenant.id, cutoff).await.unwrap();
    assert_eq!(purged, 1);

    let remaining = store.query_logs(tenant.id, 10, 0, None, None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].message, "fresh");
}
