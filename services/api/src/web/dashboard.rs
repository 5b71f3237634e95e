//! services/api/src/web/dashboard.rs
//!
//! Landing page rollups for admins and employees.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use timekeeper_core::dashboard::{
    AdminDashboard, AdminStats, EmployeeActivity, EmployeeDashboard, EmployeeDashboardStats,
};
use timekeeper_core::Viewer;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiResult, ErrorBody};
use crate::web::models::{
    AccessRequestResponse, EditRequestResponse, ReportResponse, TimeEntryResponse,
};
use crate::web::state::AppState;
use crate::web::time_entries::ActiveTimerResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminStatsResponse {
    pub total_employees: usize,
    pub active_projects: usize,
    pub pending_requests: usize,
    pub reports_today: usize,
}

impl From<AdminStats> for AdminStatsResponse {
    fn from(stats: AdminStats) -> Self {
        Self {
            total_employees: stats.total_employees,
            active_projects: stats.active_projects,
            pending_requests: stats.pending_requests,
            reports_today: stats.reports_today,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeActivityResponse {
    pub user_id: Uuid,
    pub full_name: String,
    pub last_active: Option<DateTime<Utc>>,
    pub current_location: Option<Coordinates>,
    pub hours_today: f64,
}

impl From<EmployeeActivity> for EmployeeActivityResponse {
    fn from(activity: EmployeeActivity) -> Self {
        Self {
            user_id: activity.user_id,
            full_name: activity.full_name,
            last_active: activity.last_active,
            current_location: activity
                .current_location
                .map(|(latitude, longitude)| Coordinates {
                    latitude,
                    longitude,
                }),
            hours_today: activity.hours_today,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboardResponse {
    pub stats: AdminStatsResponse,
    pub recent_activity: Vec<EmployeeActivityResponse>,
    pub pending_access_requests: Vec<AccessRequestResponse>,
    pub pending_edit_requests: Vec<EditRequestResponse>,
}

impl From<AdminDashboard> for AdminDashboardResponse {
    fn from(dashboard: AdminDashboard) -> Self {
        Self {
            stats: dashboard.stats.into(),
            recent_activity: dashboard
                .recent_activity
                .into_iter()
                .map(Into::into)
                .collect(),
            pending_access_requests: dashboard
                .pending_access_requests
                .into_iter()
                .map(Into::into)
                .collect(),
            pending_edit_requests: dashboard
                .pending_edit_requests
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeDashboardStatsResponse {
    pub hours_today: f64,
    pub hours_this_week: f64,
    pub active_projects: usize,
    pub reports_this_month: usize,
}

impl From<EmployeeDashboardStats> for EmployeeDashboardStatsResponse {
    fn from(stats: EmployeeDashboardStats) -> Self {
        Self {
            hours_today: stats.hours_today,
            hours_this_week: stats.hours_this_week,
            active_projects: stats.active_projects,
            reports_this_month: stats.reports_this_month,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeDashboardResponse {
    pub stats: EmployeeDashboardStatsResponse,
    pub active_timer: Option<ActiveTimerResponse>,
    pub recent_time_entries: Vec<TimeEntryResponse>,
    pub recent_reports: Vec<ReportResponse>,
    pub recent_access_requests: Vec<AccessRequestResponse>,
}

impl From<EmployeeDashboard> for EmployeeDashboardResponse {
    fn from(dashboard: EmployeeDashboard) -> Self {
        Self {
            stats: dashboard.stats.into(),
            active_timer: dashboard.active_timer.map(Into::into),
            recent_time_entries: dashboard
                .recent_time_entries
                .into_iter()
                .map(Into::into)
                .collect(),
            recent_reports: dashboard.recent_reports.into_iter().map(Into::into).collect(),
            recent_access_requests: dashboard
                .recent_access_requests
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// GET /api/dashboard/admin - Organisation-wide overview
#[utoipa::path(
    get,
    path = "/api/dashboard/admin",
    tag = "dashboard",
    responses(
        (status = 200, description = "Admin dashboard", body = AdminDashboardResponse),
        (status = 403, description = "Admin privileges required", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn admin_dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<AdminDashboardResponse>> {
    let dashboard = state.services.dashboard.admin(&viewer).await?;
    Ok(Json(dashboard.into()))
}

/// GET /api/dashboard/employee - The caller's own overview
#[utoipa::path(
    get,
    path = "/api/dashboard/employee",
    tag = "dashboard",
    responses(
        (status = 200, description = "Employee dashboard", body = EmployeeDashboardResponse)
    ),
    security(("bearer" = []))
)]
pub async fn employee_dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<EmployeeDashboardResponse>> {
    let dashboard = state.services.dashboard.employee(&viewer).await?;
    Ok(Json(dashboard.into()))
}
