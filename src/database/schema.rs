//! Table and index creation, run once at `Store::connect` time.
//!
//! Column layout follows §3 and the indexing guidance of §6.2.

use sqlx::{Pool, Sqlite};
use tracing::info;

pub async fn create_all(pool: &Pool<Sqlite>) -> anyhow::Result<()> {
    info!("initializing store schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT UNIQUE NOT NULL,
            api_key_hash TEXT UNIQUE NOT NULL,
            retention_days INTEGER NOT NULL DEFAULT 3,
            minute_cap INTEGER NOT NULL DEFAULT 5000,
            default_sampling TEXT,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES projects(id),
            ts DATETIME NOT NULL,
            level TEXT NOT NULL,
            message TEXT NOT NULL,
            source TEXT NOT NULL,
            env TEXT NOT NULL,
            ctx_json TEXT,
            user_id TEXT,
            request_id TEXT,
            tags TEXT,
            fingerprint TEXT NOT NULL,
            day_id INTEGER NOT NULL,
            created_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_project_created ON logs(project_id, created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_project_level_created ON logs(project_id, level, created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_project_fingerprint_created ON logs(project_id, fingerprint, created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_day_id ON logs(day_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project_minute_counters (
            kind TEXT NOT NULL,
            key TEXT NOT NULL,
            minute_utc INTEGER NOT NULL,
            count INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (kind, key, minute_utc)
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_counters_minute ON project_minute_counters(minute_utc)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS fingerprint_trackers (
            project_id INTEGER NOT NULL REFERENCES projects(id),
            fingerprint TEXT NOT NULL,
            last_seen DATETIME NOT NULL,
            last_alert DATETIME,
            minute_count INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (project_id, fingerprint)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS maintenance_state (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_maintenance DATETIME,
            in_progress BOOLEAN NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;
    sqlx::query("INSERT OR IGNORE INTO maintenance_state (id, last_maintenance, in_progress) VALUES (1, NULL, 0)")
        .execute(pool)
        .await?;

    info!("store schema ready");
    Ok(())
}
