//! services/api/src/web/employees.rs
//!
//! Admin roster endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timekeeper_core::employees::{
    AssignedProject, EmployeeChanges, EmployeeDetail, EmployeeFilter, EmployeeStats, NewEmployee,
};
use timekeeper_core::{ActivityFilter, Viewer};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::web::models::{
    MessageResponse, ProjectResponse, ReportResponse, TimeEntryResponse, UserResponse,
};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeListQuery {
    /// `active` (default), `inactive` or `all`.
    pub status: Option<String>,
    /// Matched against name and email.
    pub search: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployeeRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployeeRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeSummaryResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub last_active: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub employees: Vec<EmployeeSummaryResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeStatsResponse {
    pub hours_today: f64,
    pub hours_this_week: f64,
    pub hours_this_month: f64,
    pub active_projects: usize,
}

impl From<EmployeeStats> for EmployeeStatsResponse {
    fn from(stats: EmployeeStats) -> Self {
        Self {
            hours_today: stats.hours_today,
            hours_this_week: stats.hours_this_week,
            hours_this_month: stats.hours_this_month,
            active_projects: stats.active_projects,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignedProjectResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub assigned_at: DateTime<Utc>,
}

impl From<AssignedProject> for AssignedProjectResponse {
    fn from(assigned: AssignedProject) -> Self {
        Self {
            project: assigned.project.into(),
            assigned_at: assigned.assigned_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeDetailResponse {
    pub employee: UserResponse,
    pub stats: EmployeeStatsResponse,
    pub current_location: Option<CurrentLocation>,
    pub recent_reports: Vec<ReportResponse>,
    pub recent_time_entries: Vec<TimeEntryResponse>,
    pub assigned_projects: Vec<AssignedProjectResponse>,
}

impl From<EmployeeDetail> for EmployeeDetailResponse {
    fn from(detail: EmployeeDetail) -> Self {
        Self {
            employee: detail.user.into(),
            stats: detail.stats.into(),
            current_location: detail.current_location.map(|l| CurrentLocation {
                latitude: l.latitude,
                longitude: l.longitude,
                timestamp: l.timestamp,
            }),
            recent_reports: detail.recent_reports.into_iter().map(Into::into).collect(),
            recent_time_entries: detail
                .recent_time_entries
                .into_iter()
                .map(Into::into)
                .collect(),
            assigned_projects: detail
                .assigned_projects
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeResponse {
    pub employee: UserResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/employees - List employees
#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "employees",
    params(EmployeeListQuery),
    responses(
        (status = 200, description = "Employees", body = EmployeeListResponse),
        (status = 403, description = "Admin privileges required", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_employees_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<EmployeeListQuery>,
) -> ApiResult<Json<EmployeeListResponse>> {
    let status = match query.status.as_deref() {
        Some(value) => value.parse::<ActivityFilter>().map_err(|_| {
            ApiError::bad_request("Status must be one of active, inactive, all")
        })?,
        None => ActivityFilter::Active,
    };
    let employees = state
        .services
        .employees
        .list(
            &viewer,
            EmployeeFilter {
                status,
                search: query.search,
            },
        )
        .await?;

    Ok(Json(EmployeeListResponse {
        employees: employees
            .into_iter()
            .map(|e| EmployeeSummaryResponse {
                user: e.user.into(),
                last_active: e.last_active,
            })
            .collect(),
    }))
}

/// GET /api/employees/{id} - Employee details with work statistics
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "employees",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee detail", body = EmployeeDetailResponse),
        (status = 403, description = "Admin privileges required", body = ErrorBody),
        (status = 404, description = "Employee not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn get_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<EmployeeDetailResponse>> {
    let detail = state.services.employees.detail(&viewer, id).await?;
    Ok(Json(detail.into()))
}

/// POST /api/employees - Create an employee account
#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "employees",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = EmployeeResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<CreateEmployeeRequest>,
) -> ApiResult<(StatusCode, Json<EmployeeResponse>)> {
    let user = state
        .services
        .employees
        .create(
            &viewer,
            NewEmployee {
                email: req.email,
                password: req.password,
                full_name: req.full_name,
                role: req.role,
                is_active: req.is_active,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(EmployeeResponse {
            employee: user.into(),
        }),
    ))
}

/// PUT /api/employees/{id} - Update an employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "employees",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 404, description = "Employee not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> ApiResult<Json<EmployeeResponse>> {
    let user = state
        .services
        .employees
        .update(
            &viewer,
            id,
            EmployeeChanges {
                email: req.email,
                password: req.password,
                full_name: req.full_name,
                role: req.role,
                is_active: req.is_active,
            },
        )
        .await?;
    Ok(Json(EmployeeResponse {
        employee: user.into(),
    }))
}

/// DELETE /api/employees/{id} - Archive an employee
///
/// The account is deactivated, not removed.
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    tag = "employees",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee archived", body = MessageResponse),
        (status = 400, description = "Cannot archive your own account", body = ErrorBody),
        (status = 404, description = "Employee not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn archive_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.services.employees.archive(&viewer, id).await?;
    Ok(Json(MessageResponse::new("Employee archived successfully")))
}
