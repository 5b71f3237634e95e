//! services/api/src/web/edit_requests.rs
//!
//! Report edit requests. Approval opens a one-time, 24 hour edit window.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timekeeper_core::{EditSubmission, RequestFilter, Viewer};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiResult, ErrorBody};
use crate::web::access_requests::RejectRequest;
use crate::web::models::{EditRequestResponse, RequestListQuery};
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct SubmitEditRequest {
    pub report_id: Uuid,
    /// Required, at most 500 characters.
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EditRequestEnvelope {
    pub request: EditRequestResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EditRequestListResponse {
    pub requests: Vec<EditRequestResponse>,
}

/// POST /api/report-edit-requests - Ask to edit a submitted report
#[utoipa::path(
    post,
    path = "/api/report-edit-requests",
    tag = "edit-requests",
    request_body = SubmitEditRequest,
    responses(
        (status = 201, description = "Request submitted", body = EditRequestEnvelope),
        (status = 400, description = "Invalid reason", body = ErrorBody),
        (status = 403, description = "Not your report", body = ErrorBody),
        (status = 404, description = "Report not found", body = ErrorBody),
        (status = 409, description = "Request already pending", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn submit_edit_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<SubmitEditRequest>,
) -> ApiResult<(StatusCode, Json<EditRequestEnvelope>)> {
    let request = state
        .services
        .edit_requests
        .submit(
            &viewer,
            EditSubmission {
                report_id: req.report_id,
                reason: req.reason,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(EditRequestEnvelope {
            request: request.into(),
        }),
    ))
}

/// GET /api/report-edit-requests - List edit requests
///
/// Returns every status unless filtered. Employees only see their own.
#[utoipa::path(
    get,
    path = "/api/report-edit-requests",
    tag = "edit-requests",
    params(RequestListQuery),
    responses(
        (status = 200, description = "Edit requests", body = EditRequestListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_edit_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<RequestListQuery>,
) -> ApiResult<Json<EditRequestListResponse>> {
    let status = query.status_filter(None)?;
    let requests = state
        .services
        .edit_requests
        .list(
            &viewer,
            RequestFilter {
                status,
                ..Default::default()
            },
        )
        .await?;
    Ok(Json(EditRequestListResponse {
        requests: requests.into_iter().map(Into::into).collect(),
    }))
}

/// PUT /api/report-edit-requests/{id}/approve - Grant a 24 hour edit window
#[utoipa::path(
    put,
    path = "/api/report-edit-requests/{id}/approve",
    tag = "edit-requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request approved", body = EditRequestEnvelope),
        (status = 403, description = "Admin privileges required", body = ErrorBody),
        (status = 404, description = "Request not found", body = ErrorBody),
        (status = 409, description = "Request already reviewed", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn approve_edit_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EditRequestEnvelope>> {
    let request = state.services.edit_requests.approve(&viewer, id).await?;
    Ok(Json(EditRequestEnvelope {
        request: request.into(),
    }))
}

/// PUT /api/report-edit-requests/{id}/reject - Reject with an optional reason
#[utoipa::path(
    put,
    path = "/api/report-edit-requests/{id}/reject",
    tag = "edit-requests",
    params(("id" = Uuid, Path, description = "Request id")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Request rejected", body = EditRequestEnvelope),
        (status = 400, description = "Reason too long", body = ErrorBody),
        (status = 404, description = "Request not found", body = ErrorBody),
        (status = 409, description = "Request already reviewed", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn reject_edit_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> ApiResult<Json<EditRequestEnvelope>> {
    let request = state
        .services
        .edit_requests
        .reject(&viewer, id, req.rejection_reason)
        .await?;
    Ok(Json(EditRequestEnvelope {
        request: request.into(),
    }))
}
