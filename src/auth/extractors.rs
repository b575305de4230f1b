//! Route-facing half of the authenticator: axum extractors that turn raw
//! headers + the captured body into a resolved tenant or a verified admin
//! call, rejecting straight to an `AppError` (§4.3).

use super::raw_body::RawBody;
use super::{resolve_tenant, verify_admin_token, verify_signature};
use crate::database::TenantRecord;
use crate::errors::{AppError, AuthError};
use crate::web::AppState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;

/// A successfully authenticated API-mode request: the resolved tenant and
/// the caller's source address (used as the address-tier rate-limit key).
pub struct ApiAuth {
    pub tenant: TenantRecord,
    pub address: String,
}

impl FromRequestParts<Arc<AppState>> for ApiAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let project_key = header_str(parts, "x-project-key").ok_or(AuthError::ProjectKeyMissing)?;
        let signature = header_str(parts, "x-signature").ok_or(AuthError::SignatureMissing)?;

        let tenant = resolve_tenant(&state.store, &project_key).await?;

        let raw_body = parts
            .extensions
            .get::<RawBody>()
            .map(|b| b.0.clone())
            .unwrap_or_else(Bytes::new);

        if !verify_signature(&raw_body, &state.config.hmac_secret, &signature) {
            return Err(AuthError::SignatureInvalid.into());
        }

        let address = source_address(parts);

        Ok(ApiAuth { tenant, address })
    }
}

/// A successfully authenticated admin-mode request. Carries nothing —
/// its presence as an extractor argument is the proof of verification.
pub struct AdminAuth;

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = header_str(parts, "x-admin-token").ok_or(AuthError::AdminTokenMissing)?;
        if !verify_admin_token(&token, &state.config.admin_token) {
            return Err(AuthError::AdminTokenInvalid.into());
        }
        Ok(AdminAuth)
    }
}

fn header_str(parts: &Parts, name: &str) -> Option<String> {
    parts.headers.get(name)?.to_str().ok().map(str::to_string)
}

fn source_address(parts: &Parts) -> String {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
