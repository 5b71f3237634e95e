//! services/api/src/web/router.rs
//!
//! Assembles the HTTP routes. Everything under `/api` except registration and
//! login sits behind the bearer token middleware.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::web::{
    access_requests, auth, dashboard, edit_requests, employees, locations,
    middleware::require_auth, projects, reports, rest::health_handler, state::AppState,
    time_entries,
};

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value).allow_credentials(true),
        Err(_) => {
            warn!(origin, "Ignoring unparsable CORS origin");
            layer
        }
    }
}

/// Builds the full application router over the shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        // Employees
        .route(
            "/employees",
            get(employees::list_employees_handler).post(employees::create_employee_handler),
        )
        .route(
            "/employees/{id}",
            get(employees::get_employee_handler)
                .put(employees::update_employee_handler)
                .delete(employees::archive_employee_handler),
        )
        // Projects
        .route(
            "/projects",
            get(projects::list_projects_handler).post(projects::create_project_handler),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project_handler).put(projects::update_project_handler),
        )
        .route(
            "/projects/{id}/employees/{employee_id}",
            delete(projects::remove_employee_handler),
        )
        // Access requests
        .route(
            "/project-access-requests",
            get(access_requests::list_access_requests_handler)
                .post(access_requests::submit_access_request_handler),
        )
        .route(
            "/project-access-requests/{id}/approve",
            put(access_requests::approve_access_request_handler),
        )
        .route(
            "/project-access-requests/{id}/reject",
            put(access_requests::reject_access_request_handler),
        )
        // Edit requests
        .route(
            "/report-edit-requests",
            get(edit_requests::list_edit_requests_handler)
                .post(edit_requests::submit_edit_request_handler),
        )
        .route(
            "/report-edit-requests/{id}/approve",
            put(edit_requests::approve_edit_request_handler),
        )
        .route(
            "/report-edit-requests/{id}/reject",
            put(edit_requests::reject_edit_request_handler),
        )
        // Reports
        .route(
            "/reports",
            get(reports::list_reports_handler).post(reports::submit_report_handler),
        )
        .route(
            "/reports/{id}",
            get(reports::get_report_handler).put(reports::edit_report_handler),
        )
        // Time entries
        .route("/time-entries", get(time_entries::list_time_entries_handler))
        .route("/time-entries/start", post(time_entries::start_timer_handler))
        .route("/time-entries/active", get(time_entries::active_timer_handler))
        .route("/time-entries/manual", post(time_entries::manual_entry_handler))
        .route("/time-entries/{id}/stop", put(time_entries::stop_timer_handler))
        // Locations
        .route(
            "/locations",
            get(locations::list_locations_handler).post(locations::record_location_handler),
        )
        .route("/locations/latest", get(locations::latest_locations_handler))
        // Dashboards
        .route("/dashboard/admin", get(dashboard::admin_dashboard_handler))
        .route("/dashboard/employee", get(dashboard::employee_dashboard_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origin))
        .with_state(state)
}
