//! Drives the HTTP handlers directly against the in-memory store.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use timekeeper_core::{Clock, ManualClock, MemoryStore, Services, Viewer};

use api_lib::adapters::Argon2Hasher;
use api_lib::config::Config;
use api_lib::error::ApiError;
use api_lib::web::access_requests::{self, RejectRequest, SubmitAccessRequest};
use api_lib::web::auth::{self, LoginRequest, RegisterRequest};
use api_lib::web::edit_requests::{self, SubmitEditRequest};
use api_lib::web::models::RequestListQuery;
use api_lib::web::projects::{self, CreateProjectRequest};
use api_lib::web::reports::{self, EditReportRequest, SubmitReportRequest};
use api_lib::web::state::AppState;
use api_lib::web::time_entries::{self, ManualEntryRequest, StartTimerRequest};
use api_lib::web::token::TokenKeys;

struct TestApp {
    state: Arc<AppState>,
    clock: Arc<ManualClock>,
}

fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "JWT_SECRET" => Some("test-secret".to_string()),
        _ => None,
    })
    .unwrap()
}

fn app() -> TestApp {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap(),
    ));
    let config = Arc::new(test_config());
    let services = Services::new(
        Arc::new(MemoryStore::new()),
        clock.clone(),
        Arc::new(Argon2Hasher::default()),
    );
    let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_expiry_hours);
    TestApp {
        state: Arc::new(AppState {
            services,
            config,
            tokens,
        }),
        clock,
    }
}

fn status_of(err: ApiError) -> StatusCode {
    err.into_response().status()
}

impl TestApp {
    /// Registers through the handler and returns the viewer decoded from the issued token.
    async fn register(&self, name: &str) -> Viewer {
        let (status, Json(body)) = auth::register_handler(
            State(self.state.clone()),
            Json(RegisterRequest {
                email: format!("{}@example.com", name.to_lowercase()),
                password: "Secret123".to_string(),
                full_name: name.to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        self.state.tokens.decode(&body.token).unwrap().viewer().unwrap()
    }

    async fn project(&self, admin: &Viewer, name: &str) -> uuid::Uuid {
        let (_, Json(body)) = projects::create_project_handler(
            State(self.state.clone()),
            Extension(*admin),
            Json(CreateProjectRequest {
                name: name.to_string(),
                description: None,
                status: None,
            }),
        )
        .await
        .unwrap();
        body.project.id
    }

    /// Runs an access request for `employee` through approval.
    async fn assign(&self, admin: Viewer, employee: Viewer, project_id: uuid::Uuid) {
        let (_, Json(submitted)) = access_requests::submit_access_request_handler(
            State(self.state.clone()),
            Extension(employee),
            Json(SubmitAccessRequest { project_id }),
        )
        .await
        .unwrap();
        access_requests::approve_access_request_handler(
            State(self.state.clone()),
            Extension(admin),
            Path(submitted.request.id),
        )
        .await
        .unwrap();
    }
}

#[tokio::test]
async fn register_then_login_issues_usable_tokens() {
    let app = app();
    let admin = app.register("Ada").await;
    assert!(admin.is_admin());
    let employee = app.register("Bob").await;
    assert!(!employee.is_admin());

    let Json(login) = auth::login_handler(
        State(app.state.clone()),
        Json(LoginRequest {
            email: "BOB@example.com".to_string(),
            password: "Secret123".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(login.user.role, "employee");
    let claims = app.state.tokens.decode(&login.token).unwrap();
    assert_eq!(claims.email, "bob@example.com");

    let err = auth::login_handler(
        State(app.state.clone()),
        Json(LoginRequest {
            email: "bob@example.com".to_string(),
            password: "wrong-password".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);

    let Json(me) = auth::me_handler(State(app.state.clone()), Extension(employee))
        .await
        .unwrap();
    assert_eq!(me.user.full_name, "Bob");
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = app();
    app.register("Ada").await;
    let err = auth::register_handler(
        State(app.state.clone()),
        Json(RegisterRequest {
            email: "ada@example.com".to_string(),
            password: "Secret123".to_string(),
            full_name: "Ada Again".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(err), StatusCode::CONFLICT);
}

#[tokio::test]
async fn access_request_lifecycle_over_http() {
    let app = app();
    let admin = app.register("Ada").await;
    let employee = app.register("Bob").await;
    let project_id = app.project(&admin, "Apollo").await;

    // Unassigned employees cannot start a timer.
    let err = time_entries::start_timer_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(StartTimerRequest {
            project_id,
            task_description: "Wiring".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);

    let (status, Json(submitted)) = access_requests::submit_access_request_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(SubmitAccessRequest { project_id }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(submitted.request.status, "pending");
    let request_id = submitted.request.id;

    // The admin's default listing shows pending requests with names attached.
    let Json(pending) = access_requests::list_access_requests_handler(
        State(app.state.clone()),
        Extension(admin),
        Query(RequestListQuery { status: None }),
    )
    .await
    .unwrap();
    assert_eq!(pending.requests.len(), 1);
    assert_eq!(pending.requests[0].user_name.as_deref(), Some("Bob"));
    assert_eq!(pending.requests[0].project_name.as_deref(), Some("Apollo"));

    let err = access_requests::approve_access_request_handler(
        State(app.state.clone()),
        Extension(employee),
        Path(request_id),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);

    let Json(approved) = access_requests::approve_access_request_handler(
        State(app.state.clone()),
        Extension(admin),
        Path(request_id),
    )
    .await
    .unwrap();
    assert_eq!(approved.request.status, "approved");
    assert_eq!(approved.request.reviewed_by, Some(admin.user_id));

    let err = access_requests::reject_access_request_handler(
        State(app.state.clone()),
        Extension(admin),
        Path(request_id),
        Json(RejectRequest {
            rejection_reason: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(err), StatusCode::CONFLICT);

    // Assigned now, so the timer starts and a second one is refused.
    let (status, Json(started)) = time_entries::start_timer_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(StartTimerRequest {
            project_id,
            task_description: "Wiring".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    let err = time_entries::start_timer_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(StartTimerRequest {
            project_id,
            task_description: "Second".to_string(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(err), StatusCode::CONFLICT);

    app.clock.advance(Duration::minutes(95));
    let Json(active) =
        time_entries::active_timer_handler(State(app.state.clone()), Extension(employee))
            .await
            .unwrap();
    let active = active.timer.unwrap();
    assert_eq!(active.elapsed_seconds, 95 * 60);
    assert_eq!(active.elapsed_formatted, "1 hours 35 minutes");

    let Json(stopped) = time_entries::stop_timer_handler(
        State(app.state.clone()),
        Extension(employee),
        Path(started.timer.id),
    )
    .await
    .unwrap();
    assert_eq!(stopped.entry.duration_minutes, 95);
}

#[tokio::test]
async fn report_edit_goes_through_an_approved_request() {
    let app = app();
    let admin = app.register("Ada").await;
    let employee = app.register("Bob").await;

    let (_, Json(submitted)) = reports::submit_report_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(SubmitReportRequest {
            report_date: None,
            tasks_completed: vec!["Reviewed logs".to_string()],
            hours_worked: 7.5,
            notes: None,
        }),
    )
    .await
    .unwrap();
    let report_id = submitted.report.id;

    let edit = || EditReportRequest {
        tasks_completed: vec!["Reviewed logs".to_string(), "Fixed alerts".to_string()],
        hours_worked: 8.0,
        notes: Some("late fix".to_string()),
    };
    let err = reports::edit_report_handler(
        State(app.state.clone()),
        Extension(employee),
        Path(report_id),
        Json(edit()),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);

    let (_, Json(request)) = edit_requests::submit_edit_request_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(SubmitEditRequest {
            report_id,
            reason: "Forgot the alert fixes".to_string(),
        }),
    )
    .await
    .unwrap();
    let Json(approved) = edit_requests::approve_edit_request_handler(
        State(app.state.clone()),
        Extension(admin),
        Path(request.request.id),
    )
    .await
    .unwrap();
    assert_eq!(
        approved.request.edit_deadline,
        Some(app.clock.now() + Duration::hours(24))
    );

    let Json(detail) = reports::get_report_handler(
        State(app.state.clone()),
        Extension(employee),
        Path(report_id),
    )
    .await
    .unwrap();
    assert!(detail.can_edit);

    let Json(edited) = reports::edit_report_handler(
        State(app.state.clone()),
        Extension(employee),
        Path(report_id),
        Json(edit()),
    )
    .await
    .unwrap();
    assert_eq!(edited.report.tasks_completed.len(), 2);
    assert_eq!(edited.report.hours_worked, 8.0);

    // The grant was consumed by the edit.
    let err = reports::edit_report_handler(
        State(app.state.clone()),
        Extension(employee),
        Path(report_id),
        Json(edit()),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(err), StatusCode::FORBIDDEN);

    let Json(all) = edit_requests::list_edit_requests_handler(
        State(app.state.clone()),
        Extension(employee),
        Query(RequestListQuery { status: None }),
    )
    .await
    .unwrap();
    assert!(all.requests.is_empty());
}

#[tokio::test]
async fn unknown_status_filter_is_a_bad_request() {
    let app = app();
    let admin = app.register("Ada").await;
    let err = access_requests::list_access_requests_handler(
        State(app.state.clone()),
        Extension(admin),
        Query(RequestListQuery {
            status: Some("maybe".to_string()),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn envelopes_serialize_with_flat_timer_fields() {
    let app = app();
    let admin = app.register("Ada").await;
    let employee = app.register("Bob").await;
    let project_id = app.project(&admin, "Apollo").await;
    let (_, Json(submitted)) = access_requests::submit_access_request_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(SubmitAccessRequest { project_id }),
    )
    .await
    .unwrap();
    access_requests::approve_access_request_handler(
        State(app.state.clone()),
        Extension(admin),
        Path(submitted.request.id),
    )
    .await
    .unwrap();

    let Json(idle) =
        time_entries::active_timer_handler(State(app.state.clone()), Extension(employee))
            .await
            .unwrap();
    assert_eq!(serde_json::to_value(&idle).unwrap(), serde_json::json!({ "timer": null }));

    time_entries::start_timer_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(StartTimerRequest {
            project_id,
            task_description: "Wiring".to_string(),
        }),
    )
    .await
    .unwrap();
    let Json(running) =
        time_entries::active_timer_handler(State(app.state.clone()), Extension(employee))
            .await
            .unwrap();
    let body = serde_json::to_value(&running).unwrap();
    assert_eq!(body["timer"]["project_name"], "Apollo");
    assert_eq!(body["timer"]["entry_type"], "timer");
    assert_eq!(body["timer"]["elapsed_seconds"], 0);
    assert!(body["timer"]["end_time"].is_null());
}

#[tokio::test]
async fn manual_entry_reads_duration_hours_and_minutes() {
    let app = app();
    let admin = app.register("Ada").await;
    let employee = app.register("Bob").await;
    let project_id = app.project(&admin, "Apollo").await;
    app.assign(admin, employee, project_id).await;

    let req: ManualEntryRequest = serde_json::from_value(serde_json::json!({
        "project_id": project_id,
        "task_description": "Site survey",
        "entry_date": "2026-03-10",
        "duration_hours": 2,
        "duration_minutes": 30,
    }))
    .unwrap();
    assert_eq!(req.duration_hours, 2.0);
    assert_eq!(req.duration_minutes, 30.0);

    let (status, Json(created)) = time_entries::manual_entry_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(req),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.entry.duration_minutes, 150);
    assert_eq!(created.entry.duration_formatted, "2 hours 30 minutes");
    assert_eq!(created.entry.entry_type, "manual");
}

#[tokio::test]
async fn started_timer_is_wrapped_as_timer() {
    let app = app();
    let admin = app.register("Ada").await;
    let employee = app.register("Bob").await;
    let project_id = app.project(&admin, "Apollo").await;
    app.assign(admin, employee, project_id).await;

    let (_, Json(started)) = time_entries::start_timer_handler(
        State(app.state.clone()),
        Extension(employee),
        Json(StartTimerRequest {
            project_id,
            task_description: "Wiring".to_string(),
        }),
    )
    .await
    .unwrap();
    let body = serde_json::to_value(&started).unwrap();
    assert_eq!(body["timer"]["project_name"], "Apollo");
    assert!(body["timer"]["end_time"].is_null());
    assert!(body.get("entry").is_none());
}
