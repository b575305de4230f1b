//! Two-tier rate limiter (C4): address and tenant, both evaluated per
//! request, both backed by the same atomic minute-bucket counter in the
//! store (`database::rate_limit`).

use crate::constants::timeouts;
use crate::database::Store;
use crate::errors::{AppError, InternalError};
use axum::http::HeaderMap;
use chrono::Utc;

pub struct LimitOutcome {
    pub headers: HeaderMap,
}

/// Evaluates one tier's bucket and returns the headers to attach on
/// success, or `AppError::RateLimit` once `count` exceeds `cap`.
pub async fn check_tier(store: &Store, tier: &'static str, key: &str, cap: i64) -> Result<LimitOutcome, AppError> {
    let now = Utc::now().timestamp();
    let minute = now / 60;

    let count = tokio::time::timeout(
        timeouts::STORE_OPERATION,
        store.increment_and_read_counter(tier, key, minute),
    )
    .await
    .map_err(|_| {
        tracing::error!("rate limit counter increment timed out for tier {tier}");
        AppError::Internal(InternalError::DbQueryFailed)
    })?
    .map_err(|e| {
        tracing::error!("rate limit counter increment failed: {e}");
        AppError::Internal(InternalError::DbQueryFailed)
    })?;

    if count > cap {
        return Err(AppError::RateLimit {
            retry_after_secs: crate::constants::rate_limit::RETRY_AFTER_SECS,
            tier,
        });
    }

    let remaining = (cap - count).max(0);
    let reset = (minute + 1) * 60;

    let mut headers = HeaderMap::new();
    headers.insert(
        header_name(tier, "Limit"),
        cap.to_string().parse().expect("integer header value"),
    );
    headers.insert(
        header_name(tier, "Remaining"),
        remaining.to_string().parse().expect("integer header value"),
    );
    headers.insert(
        header_name(tier, "Reset"),
        reset.to_string().parse().expect("integer header value"),
    );

    Ok(LimitOutcome { headers })
}

fn header_name(tier: &str, suffix: &str) -> axum::http::HeaderName {
    format!("x-ratelimit-{suffix}-{tier}")
        .parse()
        .expect("header name built from a fixed tier/suffix set is always valid")
}

/// Merge one tier's observability headers into an accumulating response
/// header map, without clobbering a previous tier's entries.
pub fn merge_headers(into: &mut HeaderMap, from: HeaderMap) {
    for (name, value) in from.iter() {
        into.insert(name.clone(), value.clone());
    }
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
        // SAFETY: tests live in the same crate as `Store`; private-field
        // construction is visible to any descendant of `database`.
        crate::database::test_support::store_from_pool(pool)
    }

    #[tokio::test]
    async fn remaining_decreases_monotonically_until_cap() {
        let store = test_store().await;
        let mut last_remaining = i64::MAX;
        for _ in 0..5 {
            let outcome = check_tier(&store, "address", "1.2.3.4", 10).await.unwrap();
            let remaining: i64 = outcome
                .headers
                .get("x-ratelimit-remaining-address")
                .unwrap()
                .to_str()
                .unwrap()
                .parse()
                .unwrap();
            assert!(remaining < last_remaining);
            last_remaining = remaining;
        }
    }

    #[tokio::test]
    async fn exceeding_cap_fails_with_rate_limit_error() {
        let store = test_store().await;
        for _ in 0..3 {
            check_tier(&store, "address", "9.9.9.9", 3).await.unwrap();
        }
        let result = check_tier(&store, "address", "9.9.9.9", 3).await;
        assert!(matches!(result, Err(AppError::RateLimit { tier: "address", .. })));
    }
}
