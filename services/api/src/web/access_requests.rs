//! services/api/src/web/access_requests.rs
//!
//! Project access requests: employees ask to join, admins review.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timekeeper_core::{AccessSubmission, RequestFilter, RequestStatus, Viewer};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiResult, ErrorBody};
use crate::web::models::{AccessRequestResponse, RequestListQuery};
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct SubmitAccessRequest {
    pub project_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectRequest {
    /// At most 500 characters.
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessRequestEnvelope {
    pub request: AccessRequestResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessRequestListResponse {
    pub requests: Vec<AccessRequestResponse>,
}

/// POST /api/project-access-requests - Ask to join a project
#[utoipa::path(
    post,
    path = "/api/project-access-requests",
    tag = "access-requests",
    request_body = SubmitAccessRequest,
    responses(
        (status = 201, description = "Request submitted", body = AccessRequestEnvelope),
        (status = 404, description = "Project not found", body = ErrorBody),
        (status = 409, description = "Already assigned or already pending", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn submit_access_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<SubmitAccessRequest>,
) -> ApiResult<(StatusCode, Json<AccessRequestEnvelope>)> {
    let request = state
        .services
        .access_requests
        .submit(
            &viewer,
            AccessSubmission {
                project_id: req.project_id,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AccessRequestEnvelope {
            request: request.into(),
        }),
    ))
}

/// GET /api/project-access-requests - List access requests
///
/// Defaults to pending requests. Employees only see their own.
#[utoipa::path(
    get,
    path = "/api/project-access-requests",
    tag = "access-requests",
    params(RequestListQuery),
    responses(
        (status = 200, description = "Access requests", body = AccessRequestListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_access_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<RequestListQuery>,
) -> ApiResult<Json<AccessRequestListResponse>> {
    let status = query.status_filter(Some(RequestStatus::Pending))?;
    let requests = state
        .services
        .access_requests
        .list(
            &viewer,
            RequestFilter {
                status,
                ..Default::default()
            },
        )
        .await?;
    Ok(Json(AccessRequestListResponse {
        requests: requests.into_iter().map(Into::into).collect(),
    }))
}

/// PUT /api/project-access-requests/{id}/approve - Approve and assign the employee
#[utoipa::path(
    put,
    path = "/api/project-access-requests/{id}/approve",
    tag = "access-requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request approved", body = AccessRequestEnvelope),
        (status = 403, description = "Admin privileges required", body = ErrorBody),
        (status = 404, description = "Request not found", body = ErrorBody),
        (status = 409, description = "Request already reviewed", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn approve_access_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AccessRequestEnvelope>> {
    let request = state.services.access_requests.approve(&viewer, id).await?;
    Ok(Json(AccessRequestEnvelope {
        request: request.into(),
    }))
}

/// PUT /api/project-access-requests/{id}/reject - Reject with an optional reason
#[utoipa::path(
    put,
    path = "/api/project-access-requests/{id}/reject",
    tag = "access-requests",
    params(("id" = Uuid, Path, description = "Request id")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Request rejected", body = AccessRequestEnvelope),
        (status = 400, description = "Reason too long", body = ErrorBody),
        (status = 404, description = "Request not found", body = ErrorBody),
        (status = 409, description = "Request already reviewed", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn reject_access_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> ApiResult<Json<AccessRequestEnvelope>> {
    let request = state
        .services
        .access_requests
        .reject(&viewer, id, req.rejection_reason)
        .await?;
    Ok(Json(AccessRequestEnvelope {
        request: request.into(),
    }))
}
