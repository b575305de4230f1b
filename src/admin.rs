//! Minimal admin CRUD surface (ambient addition A3): enough to create and
//! retire tenants without a separate operator tool. Gated by the admin
//! authenticator mode (§4.3); the full dashboard UI is out of core.

use crate::auth;
use crate::database::{Store, TenantRecord};
use crate::errors::AppError;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub slug: String,
    pub retention_days: Option<i64>,
    pub minute_cap: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CreateProjectResponse {
    pub slug: String,
    /// Returned once, at creation, and never again (§3 tenant lifecycle).
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub slug: String,
    pub retention_days: i64,
    pub minute_cap: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub async fn create_project(store: &Store, request: CreateProjectRequest) -> Result<CreateProjectResponse, AppError> {
    let slug = request.slug.trim();
    if slug.is_empty() {
        return Err(crate::errors::ValidationError::InvalidEventData("slug must not be empty".to_string()).into());
    }

    let api_key = generate_api_key();
    let api_key_hash = auth::hash_api_key(&api_key);

    let tenant = store
        .create_tenant(
            slug,
            &api_key_hash,
            request.retention_days.unwrap_or(crate::constants::defaults::RETENTION_DAYS),
            request.minute_cap.unwrap_or(crate::constants::defaults::MINUTE_CAP),
        )
        .await?;

    Ok(CreateProjectResponse {
        slug: tenant.slug,
        api_key,
    })
}

pub async fn list_projects(store: &Store) -> Result<Vec<ProjectSummary>, AppError> {
    let tenants = store.list_tenants().await?;
    Ok(tenants.into_iter().map(to_summary).collect())
}

pub async fn delete_project(store: &Store, slug: &str) -> Result<bool, AppError> {
    let tenant = store.find_tenant_by_slug(slug).await?;
    let Some(tenant) = tenant else {
        return Ok(false);
    };
    store
        .delete_tenant_cascade(tenant.id)
        .await
        .map_err(|e| {
            tracing::error!("tenant cascade delete failed: {e}");
            AppError::Internal(crate::errors::InternalError::DbQueryFailed)
        })
}

fn to_summary(tenant: TenantRecord) -> ProjectSummary {
    ProjectSummary {
        slug: tenant.slug,
        retention_days: tenant.retention_days,
        minute_cap: tenant.minute_cap,
        created_at: tenant.created_at,
    }
}

/// A 32-byte random key, hex-encoded. Plaintext is surfaced exactly once,
/// in the creation response; only its hash is ever persisted.
fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}
