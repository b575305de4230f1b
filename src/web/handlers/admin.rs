//! `/admin/projects` — minimal tenant CRUD gated by `AdminAuth` (A3).

use crate::admin::{self, CreateProjectRequest};
use crate::auth::AdminAuth;
use crate::errors::AppError;
use crate::web::AppState;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{http::StatusCode, Json};
use std::sync::Arc;

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Response, AppError> {
    let created = admin::create_project(&state.store, request).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

pub async fn list_projects(State(state): State<Arc<AppState>>, _auth: AdminAuth) -> Result<Response, AppError> {
    let projects = admin::list_projects(&state.store).await?;
    Ok(Json(projects).into_response())
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    _auth: AdminAuth,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    let deleted = admin::delete_project(&state.store, &slug).await?;
    Ok(if deleted { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND })
}
