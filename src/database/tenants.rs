//! Tenant registry queries backing C3.

use super::{Store, TenantRecord};
use chrono::Utc;
use sqlx::Row;

impl Store {
    /// Lookup by `api_key_hash`. `Ok(None)` means no such tenant; `Err`
    /// means the lookup itself failed (distinct per §4.2).
    pub async fn find_tenant_by_key_hash(&self, api_key_hash: &str) -> Result<Option<TenantRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, slug, api_key_hash, retention_days, minute_cap, default_sampling, created_at, updated_at
            FROM projects WHERE api_key_hash = ?
            "#,
        )
        .bind(api_key_hash)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|row| row_to_tenant(&row)))
    }

    pub async fn find_tenant_by_slug(&self, slug: &str) -> Result<Option<TenantRecord>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, slug, api_key_hash, retention_days, minute_cap, default_sampling, created_at, updated_at
            FROM projects WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(|row| row_to_tenant(&row)))
    }

    pub async fn list_tenants(&self) -> Result<Vec<TenantRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, slug, api_key_hash, retention_days, minute_cap, default_sampling, created_at, updated_at
            FROM projects ORDER BY created_at DESC
            "#,
        )
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(row_to_tenant).collect())
    }

    pub async fn create_tenant(
        &self,
        slug: &str,
        api_key_hash: &str,
        retention_days: i64,
        minute_cap: i64,
    ) -> Result<TenantRecord, sqlx::Error> {
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO projects (slug, api_key_hash, retention_days, minute_cap, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(slug)
        .bind(api_key_hash)
        .bind(retention_days)
        .bind(minute_cap)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?
        .last_insert_rowid();

        Ok(TenantRecord {
            id,
            slug: slug.to_string(),
            api_key_hash: api_key_hash.to_string(),
            retention_days,
            minute_cap,
            default_sampling: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Delete a tenant and everything it owns. The id never gets reused by
    /// a future tenant, so the dependent rows can be deleted independently
    /// without a foreign-key-aware transaction ordering.
    pub async fn delete_tenant_cascade(&self, project_id: i64) -> anyhow::Result<bool> {
        self.with_tx(move |tx| {
            Box::pin(async move {
                sqlx::query("DELETE FROM logs WHERE project_id = ?")
                    .bind(project_id)
                    .execute(&mut **tx)
                    .await?;
                sqlx::query("DELETE FROM fingerprint_trackers WHERE project_id = ?")
                    .bind(project_id)
                    .execute(&mut **tx)
                    .await?;
                sqlx::query("DELETE FROM project_minute_counters WHERE kind = 'tenant' AND key = ?")
                    .bind(project_id.to_string())
                    .execute(&mut **tx)
                    .await?;
                let deleted = sqlx::query("DELETE FROM projects WHERE id = ?")
                    .bind(project_id)
                    .execute(&mut **tx)
                    .await?
                    .rows_affected();
                Ok(deleted > 0)
            })
        })
        .await
    }
}

fn row_to_tenant(row: &sqlx::sqlite::SqliteRow) -> TenantRecord {
    TenantRecord {
        id: row.get("id"),
        slug: row.get("slug"),
        api_key_hash: row.get("api_key_hash"),
        retention_days: row.get("retention_days"),
        minute_cap: row.get("minute_cap"),
        default_sampling: row.get("default_sampling"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
