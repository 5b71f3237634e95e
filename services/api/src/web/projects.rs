//! services/api/src/web/projects.rs
//!
//! Project catalogue endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timekeeper_core::projects::{
    AssignedEmployee, NewProject, ProjectChanges, ProjectDetail, ProjectSummary,
};
use timekeeper_core::{ActivityFilter, Viewer};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, ErrorBody};
use crate::web::models::{AccessRequestResponse, MessageResponse, ProjectResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectListQuery {
    /// `active` (default), `inactive` or `all`. Ignored for employees.
    pub status: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectSummaryResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub created_by_name: Option<String>,
    pub assigned_employees_count: usize,
}

impl From<ProjectSummary> for ProjectSummaryResponse {
    fn from(summary: ProjectSummary) -> Self {
        Self {
            project: summary.project.into(),
            created_by_name: summary.created_by_name,
            assigned_employees_count: summary.assigned_employees_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectSummaryResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignedEmployeeResponse {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub total_hours: f64,
}

impl From<AssignedEmployee> for AssignedEmployeeResponse {
    fn from(assigned: AssignedEmployee) -> Self {
        Self {
            user_id: assigned.user_id,
            full_name: assigned.full_name,
            assigned_at: assigned.assigned_at,
            total_hours: assigned.total_hours,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectDetailResponse {
    pub project: ProjectResponse,
    pub created_by_name: Option<String>,
    pub assigned_employees: Vec<AssignedEmployeeResponse>,
    pub total_hours_logged: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_requests: Option<Vec<AccessRequestResponse>>,
}

impl From<ProjectDetail> for ProjectDetailResponse {
    fn from(detail: ProjectDetail) -> Self {
        Self {
            project: detail.project.into(),
            created_by_name: detail.created_by_name,
            assigned_employees: detail
                .assigned_employees
                .into_iter()
                .map(Into::into)
                .collect(),
            total_hours_logged: detail.total_hours_logged,
            pending_requests: detail
                .pending_requests
                .map(|views| views.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectEnvelope {
    pub project: ProjectResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/projects - List projects
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    params(ProjectListQuery),
    responses(
        (status = 200, description = "Projects", body = ProjectListResponse),
        (status = 400, description = "Unknown status filter", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn list_projects_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<ProjectListQuery>,
) -> ApiResult<Json<ProjectListResponse>> {
    let filter = match query.status.as_deref() {
        Some(value) => value.parse::<ActivityFilter>().map_err(|_| {
            ApiError::bad_request("Status must be one of active, inactive, all")
        })?,
        None => ActivityFilter::Active,
    };
    let projects = state.services.projects.list(&viewer, filter).await?;
    Ok(Json(ProjectListResponse {
        projects: projects.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/projects/{id} - Project details
///
/// Employees must be assigned to the project. Pending access requests are
/// included for admins only.
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project detail", body = ProjectDetailResponse),
        (status = 403, description = "Not assigned to this project", body = ErrorBody),
        (status = 404, description = "Project not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn get_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ProjectDetailResponse>> {
    let detail = state.services.projects.detail(&viewer, id).await?;
    Ok(Json(detail.into()))
}

/// POST /api/projects - Create a project
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectEnvelope),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 409, description = "Project name already exists", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn create_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectEnvelope>)> {
    let project = state
        .services
        .projects
        .create(
            &viewer,
            NewProject {
                name: req.name,
                description: req.description,
                status: req.status,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ProjectEnvelope {
            project: project.into(),
        }),
    ))
}

/// PUT /api/projects/{id} - Update a project
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "projects",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectEnvelope),
        (status = 400, description = "Invalid request", body = ErrorBody),
        (status = 404, description = "Project not found", body = ErrorBody),
        (status = 409, description = "Project name already exists", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn update_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectEnvelope>> {
    let project = state
        .services
        .projects
        .update(
            &viewer,
            id,
            ProjectChanges {
                name: req.name,
                description: req.description,
                status: req.status,
            },
        )
        .await?;
    Ok(Json(ProjectEnvelope {
        project: project.into(),
    }))
}

/// DELETE /api/projects/{id}/employees/{employee_id} - Remove an employee from a project
#[utoipa::path(
    delete,
    path = "/api/projects/{id}/employees/{employee_id}",
    tag = "projects",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("employee_id" = Uuid, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "Employee removed", body = MessageResponse),
        (status = 404, description = "Assignment not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn remove_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path((id, employee_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .services
        .projects
        .remove_employee(&viewer, id, employee_id)
        .await?;
    Ok(Json(MessageResponse::new(
        "Employee removed from project successfully",
    )))
}
