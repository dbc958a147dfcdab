use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::domain::{EntityId, JurisdictionId, ProjectId};
use crate::lookup::LookupError;
use crate::service::{AdvocacyService, ServiceError};
use crate::status::ScopeError;
use crate::store::AdvocacyStore;

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub address: String,
    #[serde(default)]
    pub jurisdiction_id: Option<JurisdictionId>,
}

#[derive(Debug, Deserialize)]
pub struct ScopedDistributionRequest {
    pub entity_ids: Vec<EntityId>,
}

/// Router builder exposing the lookup and status distribution endpoints.
pub fn advocacy_router<S>(service: Arc<AdvocacyService<S>>) -> Router
where
    S: AdvocacyStore + 'static,
{
    Router::new()
        .route("/api/v1/lookup", post(lookup_handler::<S>))
        .route("/api/v1/projects", get(projects_handler::<S>))
        .route(
            "/api/v1/projects/:project_id/status-distribution",
            get(jurisdiction_distribution_handler::<S>).post(scoped_distribution_handler::<S>),
        )
        .with_state(service)
}

pub async fn lookup_handler<S>(
    State(service): State<Arc<AdvocacyService<S>>>,
    axum::Json(request): axum::Json<LookupRequest>,
) -> Response
where
    S: AdvocacyStore + 'static,
{
    match service
        .lookup(&request.address, request.jurisdiction_id.as_ref())
        .await
    {
        Ok(representation) => (StatusCode::OK, axum::Json(representation)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn projects_handler<S>(State(service): State<Arc<AdvocacyService<S>>>) -> Response
where
    S: AdvocacyStore + 'static,
{
    match service.projects_overview() {
        Ok(projects) => (StatusCode::OK, axum::Json(projects)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn jurisdiction_distribution_handler<S>(
    State(service): State<Arc<AdvocacyService<S>>>,
    Path(project_id): Path<String>,
) -> Response
where
    S: AdvocacyStore + 'static,
{
    match service.jurisdiction_distribution(&ProjectId(project_id)) {
        Ok(distribution) => (StatusCode::OK, axum::Json(distribution)).into_response(),
        Err(err) => error_response(err),
    }
}

pub async fn scoped_distribution_handler<S>(
    State(service): State<Arc<AdvocacyService<S>>>,
    Path(project_id): Path<String>,
    axum::Json(request): axum::Json<ScopedDistributionRequest>,
) -> Response
where
    S: AdvocacyStore + 'static,
{
    match service.scoped_distribution(&ProjectId(project_id), request.entity_ids) {
        Ok(distribution) => (StatusCode::OK, axum::Json(distribution)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Lookup(LookupError::GeocodeFailed(reason)) => {
            let payload = json!({
                "error": "could not locate that address",
                "detail": reason.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ServiceError::UnknownProject(id) => {
            let payload = json!({
                "error": format!("project '{id}' does not exist"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        ServiceError::Scope(ScopeError::UnknownEntity(id)) => {
            let payload = json!({
                "error": format!("entity '{id}' does not exist"),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        other => {
            error!(error = %other, "request failed");
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
