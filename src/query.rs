//! Query service (C8): filtered, paginated reads over a tenant's logs.

use crate::constants::limits;
use crate::database::{Store, StoredLog};
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct QueryParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub level: Option<String>,
    pub since: Option<DateTime<Utc>>,
}

/// Clamp the caller-supplied limit to `[1, MAX_QUERY_LIMIT]`, defaulting
/// to `DEFAULT_QUERY_LIMIT` when absent (§4.5 query contract).
fn effective_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(limits::DEFAULT_QUERY_LIMIT)
        .clamp(1, limits::MAX_QUERY_LIMIT)
}

pub async fn run(store: &Store, project_id: i64, params: &QueryParams) -> Result<Vec<StoredLog>, sqlx::Error> {
    let limit = effective_limit(params.limit);
    let offset = params.offset.unwrap_or(0).max(0);
    store
        .query_logs(project_id, limit, offset, params.level.as_deref(), params.since)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(effective_limit(None), limits::DEFAULT_QUERY_LIMIT);
        assert_eq!(effective_limit(Some(0)), 1);
        assert_eq!(effective_limit(Some(100_000)), limits::MAX_QUERY_LIMIT);
        assert_eq!(effective_limit(Some(50)), 50);
    }
}
