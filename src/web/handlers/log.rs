//! `POST /api/log` (ingest) and `GET /api/log` (query) — the core data
//! path: auth → rate limit → pipeline → maintenance trigger (§4.5).

use crate::auth::ApiAuth;
use crate::errors::{AppError, ValidationError};
use crate::ingest::{self, IngestRequest, IngestResponse};
use crate::query::{self, QueryParams};
use crate::rate_limit::{self, merge_headers};
use crate::web::AppState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use std::sync::Arc;

pub async fn post_log(
    State(state): State<Arc<AppState>>,
    auth: ApiAuth,
    Json(request): Json<IngestRequest>,
) -> Result<Response, AppError> {
    let mut headers = HeaderMap::new();
    merge_headers(
        &mut headers,
        rate_limit::check_tier(&state.store, "address", &auth.address, state.config.rate_limit_per_ip)
            .await?
            .headers,
    );
    merge_headers(
        &mut headers,
        rate_limit::check_tier(
            &state.store,
            "tenant",
            &auth.tenant.id.to_string(),
            auth.tenant.minute_cap.min(state.config.rate_limit_per_minute),
        )
        .await?
        .headers,
    );

    ingest::validate_batch_size(request.events.len(), state.config.max_events_per_post)?;

    let received_at = Utc::now();
    let rows = ingest::build_rows(&auth.tenant, &request.events, received_at)?;

    let processed = state.store.bulk_insert_logs(&rows).await?;

    // Fire-and-forget: the maintenance pass, if due, runs independently
    // and never delays this response (§4.6).
    state.scheduler.maybe_trigger(state.store.clone());

    let body = Json(IngestResponse {
        received: request.events.len(),
        processed,
        request_id: ingest::new_request_id(),
    });

    Ok((headers, body).into_response())
}

pub async fn get_log(
    State(state): State<Arc<AppState>>,
    auth: ApiAuth,
    Query(params): Query<QueryParams>,
) -> Result<Response, AppError> {
    let mut headers = HeaderMap::new();
    merge_headers(
        &mut headers,
        rate_limit::check_tier(&state.store, "address", &auth.address, state.config.rate_limit_per_ip)
            .await?
            .headers,
    );
    merge_headers(
        &mut headers,
        rate_limit::check_tier(
            &state.store,
            "tenant",
            &auth.tenant.id.to_string(),
            auth.tenant.minute_cap.min(state.config.rate_limit_per_minute),
        )
        .await?
        .headers,
    );

    if let Some(level) = &params.level {
        if !["debug", "info", "warn", "error", "fatal"].contains(&level.as_str()) {
            return Err(ValidationError::InvalidEventData(format!("unknown level {level:?}")).into());
        }
    }

    let rows = query::run(&state.store, auth.tenant.id, &params).await?;

    Ok((headers, Json(rows)).into_response())
}
