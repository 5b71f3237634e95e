//! services/api/src/web/rest.rs
//!
//! The health probe and the master OpenAPI document.

use axum::Json;
use serde::Serialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::error::ErrorBody;
use crate::web::{
    access_requests, auth, dashboard, edit_requests, employees, locations, models, projects,
    reports, time_entries,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::me_handler,
        employees::list_employees_handler,
        employees::get_employee_handler,
        employees::create_employee_handler,
        employees::update_employee_handler,
        employees::archive_employee_handler,
        projects::list_projects_handler,
        projects::get_project_handler,
        projects::create_project_handler,
        projects::update_project_handler,
        projects::remove_employee_handler,
        access_requests::submit_access_request_handler,
        access_requests::list_access_requests_handler,
        access_requests::approve_access_request_handler,
        access_requests::reject_access_request_handler,
        edit_requests::submit_edit_request_handler,
        edit_requests::list_edit_requests_handler,
        edit_requests::approve_edit_request_handler,
        edit_requests::reject_edit_request_handler,
        reports::submit_report_handler,
        reports::list_reports_handler,
        reports::get_report_handler,
        reports::edit_report_handler,
        time_entries::list_time_entries_handler,
        time_entries::start_timer_handler,
        time_entries::stop_timer_handler,
        time_entries::active_timer_handler,
        time_entries::manual_entry_handler,
        locations::record_location_handler,
        locations::list_locations_handler,
        locations::latest_locations_handler,
        dashboard::admin_dashboard_handler,
        dashboard::employee_dashboard_handler,
    ),
    components(
        schemas(
            ErrorBody,
            HealthResponse,
            models::UserResponse,
            models::ProjectResponse,
            models::AccessRequestResponse,
            models::EditRequestResponse,
            models::ReportResponse,
            models::TimeEntryResponse,
            models::LocationResponse,
            models::MessageResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "employees", description = "Roster management (admin)"),
        (name = "projects", description = "Project catalogue and assignments"),
        (name = "access-requests", description = "Requests to join a project"),
        (name = "edit-requests", description = "Requests to edit a submitted report"),
        (name = "reports", description = "Daily reports"),
        (name = "time-entries", description = "Timer and manual time entries"),
        (name = "locations", description = "GPS location log"),
        (name = "dashboard", description = "Landing page rollups")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Health
//=========================================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// GET /health - Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "auth",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
