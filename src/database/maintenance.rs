//! Store-side operations for the on-path maintenance scheduler (C7).

use super::Store;
use chrono::{DateTime, Utc};
use sqlx::Row;

pub struct MaintenanceStateRow {
    pub last_maintenance: Option<DateTime<Utc>>,
    pub in_progress: bool,
}

impl Store {
    pub async fn get_maintenance_state(&self) -> Result<MaintenanceStateRow, sqlx::Error> {
        let row = sqlx::query("SELECT last_maintenance, in_progress FROM maintenance_state WHERE id = 1")
            .fetch_one(self.pool())
            .await?;
        Ok(MaintenanceStateRow {
            last_maintenance: row.get("last_maintenance"),
            in_progress: row.get::<i64, _>("in_progress") != 0,
        })
    }

    /// Sets `in_progress = true` only if it was false; returns whether the
    /// flag was actually acquired (guards against a second instance racing
    /// in). `force` ignores the current value — used for stuck recovery.
    pub async fn try_begin_maintenance(&self, force: bool) -> Result<bool, sqlx::Error> {
        let sql = if force {
            "UPDATE maintenance_state SET in_progress = 1 WHERE id = 1"
        } else {
            "UPDATE maintenance_state SET in_progress = 1 WHERE id = 1 AND in_progress = 0"
        };
        let result = sqlx::query(sql).execute(self.pool()).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn end_maintenance(&self) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE maintenance_state SET in_progress = 0, last_maintenance = ? WHERE id = 1")
            .bind(Utc::now())
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Counter expiry (rate limiter tier): buckets older than `cutoff_minute`.
    pub async fn purge_stale_counters(&self, cutoff_minute: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_minute_counters WHERE kind = 'address' AND minute_utc < ?")
            .bind(cutoff_minute)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Counter expiry (tenant-activity tier, a longer retention window).
    pub async fn purge_stale_tenant_counters(&self, cutoff_minute: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_minute_counters WHERE kind = 'tenant' AND minute_utc < ?")
            .bind(cutoff_minute)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Retention purge for a single tenant's `day_id` cutoff (per-tenant
    /// purge per the Open Questions decision recorded in DESIGN.md).
    pub async fn purge_logs_before_day(&self, project_id: i64, cutoff_day_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM logs WHERE project_id = ? AND day_id < ?")
            .bind(project_id)
            .bind(cutoff_day_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_idle_fingerprint_trackers(&self, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM fingerprint_trackers WHERE last_seen < ?")
            .bind(cutoff)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// `(project_id, retention_days)` for every tenant, used to drive the
    /// per-tenant retention purge.
    pub async fn tenant_retention_settings(&self) -> Result<Vec<(i64, i64)>, sqlx::Error> {
        let rows = sqlx::query("SELECT id, retention_days FROM projects")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.iter().map(|row| (row.get("id"), row.get("retention_days"))).collect())
    }
}
