//! services/api/src/web/reports.rs
//!
//! Daily report endpoints. Edits go through an approved edit request.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timekeeper_core::reports::{NewReport, ReportEdit, ReportFilter};
use timekeeper_core::Viewer;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiResult, ErrorBody};
use crate::web::models::ReportResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SubmitReportRequest {
    /// Defaults to today.
    pub report_date: Option<NaiveDate>,
    pub tasks_completed: Vec<String>,
    pub hours_worked: f64,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct EditReportRequest {
    pub tasks_completed: Vec<String>,
    pub hours_worked: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportListQuery {
    /// Ignored for employees.
    pub user_id: Option<Uuid>,
    /// Defaults to seven days ago.
    pub start_date: Option<NaiveDate>,
    /// Defaults to today.
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportEnvelope {
    pub report: ReportResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportListResponse {
    pub reports: Vec<ReportResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportDetailResponse {
    pub report: ReportResponse,
    /// Whether the caller may edit the report right now.
    pub can_edit: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/reports - Submit a daily report
#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "reports",
    request_body = SubmitReportRequest,
    responses(
        (status = 201, description = "Report submitted", body = ReportEnvelope),
        (status = 400, description = "Invalid report", body = ErrorBody),
        (status = 409, description = "Report already exists for this date", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn submit_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<SubmitReportRequest>,
) -> ApiResult<(StatusCode, Json<ReportEnvelope>)> {
    let report = state
        .services
        .reports
        .submit(
            &viewer,
            NewReport {
                report_date: req.report_date,
                tasks_completed: req.tasks_completed,
                hours_worked: req.hours_worked,
                notes: req.notes,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ReportEnvelope {
            report: report.into(),
        }),
    ))
}

/// GET /api/reports - List reports in a date range
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "reports",
    params(ReportListQuery),
    responses(
        (status = 200, description = "Reports, newest first", body = ReportListResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_reports_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<ReportListQuery>,
) -> ApiResult<Json<ReportListResponse>> {
    let reports = state
        .services
        .reports
        .list(
            &viewer,
            ReportFilter {
                user_id: query.user_id,
                start_date: query.start_date,
                end_date: query.end_date,
            },
        )
        .await?;
    debug!(count = reports.len(), "reports listed");
    Ok(Json(ReportListResponse {
        reports: reports.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/reports/{id} - One report, with the caller's edit permission
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "reports",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report", body = ReportDetailResponse),
        (status = 403, description = "Access denied", body = ErrorBody),
        (status = 404, description = "Report not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn get_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReportDetailResponse>> {
    let detail = state.services.reports.get(&viewer, id).await?;
    Ok(Json(ReportDetailResponse {
        report: ReportResponse::named(detail.report, detail.user_name),
        can_edit: detail.can_edit,
    }))
}

/// PUT /api/reports/{id} - Edit a report under an approved edit request
///
/// The edit request is consumed; a second edit needs a new approval.
#[utoipa::path(
    put,
    path = "/api/reports/{id}",
    tag = "reports",
    params(("id" = Uuid, Path, description = "Report id")),
    request_body = EditReportRequest,
    responses(
        (status = 200, description = "Report updated", body = ReportEnvelope),
        (status = 400, description = "Invalid report", body = ErrorBody),
        (status = 403, description = "No active edit permission", body = ErrorBody),
        (status = 404, description = "Report not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn edit_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
    Json(req): Json<EditReportRequest>,
) -> ApiResult<Json<ReportEnvelope>> {
    let report = state
        .services
        .reports
        .apply_edit(
            &viewer,
            id,
            ReportEdit {
                tasks_completed: req.tasks_completed,
                hours_worked: req.hours_worked,
                notes: req.notes,
            },
        )
        .await?;
    Ok(Json(ReportEnvelope {
        report: report.into(),
    }))
}
