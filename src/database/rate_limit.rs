//! Atomic minute-bucket counters backing C4.

use super::Store;
use sqlx::Row;

impl Store {
    /// Atomically upsert `(kind, key, minute_utc)`, incrementing `count`,
    /// and read back the post-increment value. The unique key makes this
    /// a single linearisation point per bucket — concurrent callers never
    /// observe a torn increment.
    pub async fn increment_and_read_counter(
        &self,
        kind: &str,
        key: &str,
        minute_utc: i64,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO project_minute_counters (kind, key, minute_utc, count)
            VALUES (?, ?, ?, 1)
            ON CONFLICT (kind, key, minute_utc) DO UPDATE SET count = count + 1
            "#,
        )
        .bind(kind)
        .bind(key)
        .bind(minute_utc)
        .execute(self.pool())
        .await?;

        let row = sqlx::query(
            "SELECT count FROM project_minute_counters WHERE kind = ? AND key = ? AND minute_utc = ?",
        )
        .bind(kind)
        .bind(key)
        .bind(minute_utc)
        .fetch_one(self.pool())
        .await?;

        Ok(row.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema;

    async fn test_store() -> Store {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        schema::create_all(&pool).await.unwrap();
        Store { pool }
    }

    #[tokio::test]
    async fn increments_are_monotone_within_a_bucket() {
        let store = test_store().await;
        let a = store.increment_and_read_counter("address", "1.2.3.4", 100).await.unwrap();
        let b = store.increment_and_read_counter("address", "1.2.3.4", 100).await.unwrap();
        let c = store.increment_and_read_counter("address", "1.2.3.4", 100).await.unwrap();
        assert_eq!((a, b, c), (1, 2, 3));
    }

    #[tokio::test]
    async fn distinct_buckets_are_independent() {
        let store = test_store().await;
        let a = store.increment_and_read_counter("address", "1.2.3.4", 100).await.unwrap();
        let b = store.increment_and_read_counter("address", "1.2.3.4", 101).await.unwrap();
        assert_eq!((a, b), (1, 1));
    }
}
