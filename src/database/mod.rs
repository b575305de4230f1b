//! Store (C2): a pooled connection to the relational database.
//!
//! Higher-level modules (`tenants`, `logs`, `rate_limit`, `maintenance`)
//! bind their own parameterised statements against the pool exposed here —
//! no caller builds SQL by interpolating user data.

pub mod logs;
pub mod maintenance;
pub mod rate_limit;
pub mod records;
pub mod schema;
pub mod tenants;

pub use records::*;

use crate::constants::pool;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, Transaction};
use tracing::{error, info};

pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("connecting to store at {database_url}");

        let pool = SqlitePoolOptions::new()
            .min_connections(pool::MIN_CONNECTIONS)
            .max_connections(pool::MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(|e| {
                error!("store connection failed: {e}");
                e
            })?;

        let store = Self { pool };
        schema::create_all(store.pool()).await?;
        Ok(store)
    }

    /// Begin/commit/rollback around a closure: rollback on any error,
    /// commit on success. The spec's `withTx` contract.
    pub async fn with_tx<F, T>(&self, work: F) -> anyhow::Result<T>
    where
        F: for<'c> FnOnce(
            &'c mut Transaction<'_, Sqlite>,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<T>> + Send + 'c>>,
    {
        let mut tx = self.pool.begin().await?;
        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!("rollback failed after error {e}: {rollback_err}");
                }
                Err(e)
            }
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Lets sibling modules' test suites build a `Store` over an in-memory
/// pool without exposing the private field outside `#[cfg(test)]`.
#[cfg(test)]
pub mod test_support {
    use super::Store;
    use sqlx::{Pool, Sqlite};

    pub fn store_from_pool(pool: Pool<Sqlite>) -> Store {
        Store { pool }
    }
}
