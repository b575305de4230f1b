//! Log persistence and retrieval backing C6 (ingest) and C8 (query).

use super::{NewLogRow, Store, StoredLog};
use crate::errors::{AppError, InternalError};
use sqlx::Row;

impl Store {
    /// Build a single multi-row `VALUES` clause and insert it in one
    /// round-trip (§4.5, §9 "bulk insert shape"). Rejects an empty batch —
    /// callers should short-circuit before calling this.
    pub async fn bulk_insert_logs(&self, rows: &[NewLogRow]) -> Result<u64, AppError> {
        if rows.is_empty() {
            return Ok(0);
        }

        const COLUMNS: usize = 13;
        let mut sql = String::with_capacity(128 + rows.len() * (COLUMNS * 2 + 4));
        sql.push_str(
            "INSERT INTO logs (project_id, ts, level, message, source, env, ctx_json, user_id, request_id, tags, fingerprint, day_id, created_at) VALUES ",
        );

        for i in 0..rows.len() {
            if i > 0 {
                sql.push(',');
            }
            sql.push('(');
            for col in 0..COLUMNS {
                if col > 0 {
                    sql.push(',');
                }
                sql.push('?');
            }
            sql.push(')');
        }

        let mut query = sqlx::query(&sql);
        for row in rows {
            query = query
                .bind(row.project_id)
                .bind(row.ts)
                .bind(&row.level)
                .bind(&row.message)
                .bind(&row.source)
                .bind(&row.env)
                .bind(&row.ctx_json)
                .bind(&row.user_id)
                .bind(&row.request_id)
                .bind(&row.tags)
                .bind(&row.fingerprint)
                .bind(row.day_id)
                .bind(row.created_at);
        }

        let result = query.execute(self.pool()).await.map_err(|e| {
            tracing::error!("bulk insert failed: {e}");
            AppError::Internal(InternalError::DbBulkInsertFailed)
        })?;

        Ok(result.rows_affected())
    }

    /// Tenant-scoped, filtered, paginated read (C8). `limit` is already
    /// clamped by the caller to the hard cap.
    pub async fn query_logs(
        &self,
        project_id: i64,
        limit: i64,
        offset: i64,
        level: Option<&str>,
        since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Vec<StoredLog>, sqlx::Error> {
        let mut sql = String::from(
            "SELECT id, project_id, ts, level, message, source, env, ctx_json, user_id, request_id, tags, fingerprint, day_id, created_at FROM logs WHERE project_id = ?",
        );
        if level.is_some() {
            sql.push_str(" AND level = ?");
        }
        if since.is_some() {
            sql.push_str(" AND created_at >= ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&sql).bind(project_id);
        if let Some(level) = level {
            query = query.bind(level);
        }
        if let Some(since) = since {
            query = query.bind(since);
        }
        query = query.bind(limit).bind(offset);

        let rows = query.fetch_all(self.pool()).await?;
        Ok(rows.iter().map(row_to_stored_log).collect())
    }
}

fn row_to_stored_log(row: &sqlx::sqlite::SqliteRow) -> StoredLog {
    StoredLog {
        id: row.get("id"),
        project_id: row.get("project_id"),
        ts: row.get("ts"),
        level: row.get("level"),
        message: row.get("message"),
        source: row.get("source"),
        env: row.get("env"),
        ctx_json: row.get("ctx_json"),
        user_id: row.get("user_id"),
        request_id: row.get("request_id"),
        tags: row.get("tags"),
        fingerprint: row.get("fingerprint"),
        day_id: row.get("day_id"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema;
    use chrono::Utc;

    async fn test_store() -> Store {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        schema::create_all(&pool).await.unwrap();
        Store { pool }
    }

    fn sample_row(project_id: i64, message: &str) -> NewLogRow {
        let now = Utc::now();
        NewLogRow {
            project_id,
            ts: now,
            level: "error".to_string(),
            message: message.to_string(),
            source: "test".to_string(),
            env: "production".to_string(),
            ctx_json: None,
            user_id: None,
            request_id: None,
            tags: None,
            fingerprint: "abc123".to_string(),
            day_id: 20260801,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn bulk_insert_empty_batch_short_circuits() {
        let store = test_store().await;
        let inserted = store.bulk_insert_logs(&[]).await.unwrap();
        assert_eq!(inserted, 0);
    }

    #[tokio::test]
    async fn bulk_insert_then_query_round_trips() {
        let store = test_store().await;
        let tenant = store
            .create_tenant("acme", "hash123", 3, 5000)
            .await
            .unwrap();

        let rows = vec![sample_row(tenant.id, "boom"), sample_row(tenant.id, "bang")];
        let inserted = store.bulk_insert_logs(&rows).await.unwrap();
        assert_eq!(inserted, 2);

        let found = store
            .query_logs(tenant.id, 10, 0, Some("error"), None)
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].message, "bang");
    }
}
