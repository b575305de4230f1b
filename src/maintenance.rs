//! On-path maintenance scheduler (C7): fire-and-forget housekeeping
//! piggybacked onto successful ingest requests, replacing an external cron.

use crate::constants::{maintenance, rate_limit, timeouts};
use crate::database::Store;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Process-local gate (§4.6, §5): the last time this process spawned a
/// maintenance pass, as a Unix timestamp. `0` means "never" and always
/// triggers. A plain atomic is enough because the only write is the
/// compare-and-set in `maybe_trigger`.
pub struct Scheduler {
    last_triggered_at: AtomicI64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            last_triggered_at: AtomicI64::new(0),
        }
    }

    /// Evaluated at the end of a successful ingest. Non-blocking: the
    /// maintenance task, if spawned, runs independently and never delays
    /// the caller's response.
    pub fn maybe_trigger(self: &Arc<Self>, store: Arc<Store>) {
        let now = Utc::now().timestamp();
        let previous = self.last_triggered_at.load(Ordering::SeqCst);
        let interval = maintenance::TRIGGER_INTERVAL.as_secs() as i64;

        if now - previous < interval {
            return;
        }

        // Set before spawning so a second concurrent caller within the
        // same process sees the updated value and skips (§4.6 step 2).
        if self
            .last_triggered_at
            .compare_exchange(previous, now, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let gate_age = if previous == 0 { i64::MAX } else { now - previous };
        tokio::spawn(async move {
            run(&store, gate_age).await;
        });
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// The maintenance pass itself. Each step tolerates its own failure
/// without aborting the rest (§4.6); errors are logged, never propagated.
async fn run(store: &Store, gate_age_secs: i64) {
    tracing::info!("maintenance pass starting");

    let acquired = match with_timeout(store.try_begin_maintenance(should_force(gate_age_secs))).await {
        Some(Ok(acquired)) => acquired,
        Some(Err(e)) => {
            tracing::warn!("maintenance: failed to acquire store flag: {e}");
            return;
        }
        None => {
            tracing::warn!("maintenance: acquiring store flag timed out");
            return;
        }
    };

    if !acquired {
        tracing::info!("maintenance: already in progress elsewhere, skipping");
        return;
    }

    let now_minute = Utc::now().timestamp() / 60;

    purge_step("address counter expiry", with_timeout(store.purge_stale_counters(now_minute - rate_limit::STALE_MINUTES)).await);
    purge_step(
        "tenant counter expiry",
        with_timeout(store.purge_stale_tenant_counters(now_minute - maintenance::TENANT_ACTIVITY_STALE_MINUTES)).await,
    );
    purge_step("fingerprint tracker expiry", with_timeout(store.purge_idle_fingerprint_trackers(Utc::now() - chrono::Duration::from_std(maintenance::FINGERPRINT_IDLE).unwrap())).await);

    run_retention_purge(store).await;

    if let Some(Err(e)) = with_timeout(store.end_maintenance()).await {
        tracing::warn!("maintenance: failed to clear store flag: {e}");
    }

    tracing::info!("maintenance pass complete");
}

/// Per-tenant retention purge (§9 Open Questions: a faithful
/// implementation purges per tenant rather than against one global
/// default).
async fn run_retention_purge(store: &Store) {
    let today = Utc::now().date_naive();

    let tenants = match with_timeout(store.tenant_retention_settings()).await {
        Some(Ok(tenants)) => tenants,
        Some(Err(e)) => {
            tracing::warn!("maintenance: failed to list tenant retention settings: {e}");
            return;
        }
        None => {
            tracing::warn!("maintenance: listing tenant retention settings timed out");
            return;
        }
    };

    for (project_id, retention_days) in tenants {
        let cutoff = cutoff_day_id(today, retention_days);
        purge_step(
            &format!("retention purge for project {project_id}"),
            with_timeout(store.purge_logs_before_day(project_id, cutoff)).await,
        );
    }
}

/// Calendar-day subtraction, not integer arithmetic on the packed
/// `YYYYMMDD` value: `20260801 - 3` is not `20260729`.
fn cutoff_day_id(today: chrono::NaiveDate, retention_days: i64) -> i64 {
    let cutoff_date = today - chrono::Duration::days(retention_days);
    cutoff_date.format("%Y%m%d").to_string().parse().expect("YYYYMMDD is numeric")
}

fn should_force(gate_age_secs: i64) -> bool {
    gate_age_secs >= maintenance::STUCK_RECOVERY.as_secs() as i64
}

fn purge_step(label: &str, outcome: Option<Result<u64, sqlx::Error>>) {
    match outcome {
        Some(Ok(affected)) => {
            if affected > 0 {
                tracing::info!("maintenance: {label} removed {affected} rows");
            }
        }
        Some(Err(e)) => tracing::warn!("maintenance: {label} failed: {e}"),
        None => tracing::warn!("maintenance: {label} timed out"),
    }
}

async fn with_timeout<T>(fut: impl std::future::Future<Output = T>) -> Option<T> {
    tokio::time::timeout(timeouts::STORE_OPERATION, fut).await.ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> Store {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        schema::create_all(&pool).await.unwrap();
        crate::database::test_support::store_from_pool(pool)
    }

    #[test]
    fn cutoff_day_id_crosses_month_boundaries() {
        let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        // Integer subtraction on the packed value would give 20260798.
        assert_eq!(cutoff_day_id(today, 3), 20260729);
    }

    #[test]
    fn never_triggered_always_fires() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.last_triggered_at.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn maybe_trigger_is_a_noop_within_the_interval() {
        let store = Arc::new(test_store().await);
        let scheduler = Arc::new(Scheduler::new());
        scheduler.last_triggered_at.store(Utc::now().timestamp(), Ordering::SeqCst);
        let before = scheduler.last_triggered_at.load(Ordering::SeqCst);
        scheduler.maybe_trigger(store);
        // compare_exchange never runs because the delta check short-circuits first.
        assert_eq!(scheduler.last_triggered_at.load(Ordering::SeqCst), before);
    }

    #[tokio::test]
    async fn idempotent_run_leaves_same_post_state() {
        let store = test_store().await;
        run(&store, i64::MAX).await;
        let state_after_first = store.get_maintenance_state().await.unwrap();
        run(&store, i64::MAX).await;
        let state_after_second = store.get_maintenance_state().await.unwrap();
        assert!(!state_after_first.in_progress);
        assert!(!state_after_second.in_progress);
    }
}
