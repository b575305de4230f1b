//! Raw-body capture (§6.1, §9 "Raw-body preservation").
//!
//! The HMAC must cover the exact bytes the client signed. Any
//! deserialise-then-reserialise path changes whitespace or key ordering
//! and silently breaks verification, so this middleware taps the body
//! before axum's `Json` extractor ever sees it and stashes the untouched
//! bytes in request extensions for the authenticator to read.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use crate::errors::{AppError, ValidationError};

/// The exact bytes the authenticator must verify a signature against: the
/// request body for mutating methods, or the raw query string for `GET`.
#[derive(Clone)]
pub struct RawBody(pub Bytes);

/// Generous ceiling for reading the body into memory here; the real
/// per-route payload limit (`MAX_PAYLOAD_BYTES`) is enforced separately by
/// `tower_http`'s request body limit layer, which runs first.
const CAPTURE_LIMIT_BYTES: usize = 8 * 1024 * 1024;

pub async fn capture_raw_body(req: Request, next: Next) -> Response {
    if req.method() == Method::GET || req.method() == Method::HEAD {
        let raw = req.uri().query().unwrap_or("").as_bytes().to_vec();
        let mut req = req;
        req.extensions_mut().insert(RawBody(Bytes::from(raw)));
        return next.run(req).await;
    }

    let (parts, body) = req.into_parts();
    let bytes = match to_bytes(body, CAPTURE_LIMIT_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return AppError::Validation(ValidationError::InvalidEventData(
                "request body could not be read".to_string(),
            ))
            .into_response();
        }
    };

    let mut req = Request::from_parts(parts, Body::from(bytes.clone()));
    req.extensions_mut().insert(RawBody(bytes));
    next.run(req).await
}
