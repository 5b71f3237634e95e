//! services/api/src/web/time_entries.rs
//!
//! Timer and manual time entry endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timekeeper_core::clock::format_duration;
use timekeeper_core::timer::{ActiveTimer, ManualEntry, TimeEntryFilter};
use timekeeper_core::Viewer;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiResult, ErrorBody};
use crate::web::models::TimeEntryResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct StartTimerRequest {
    pub project_id: Uuid,
    pub task_description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ManualEntryRequest {
    pub project_id: Uuid,
    pub task_description: String,
    pub entry_date: NaiveDate,
    #[serde(default)]
    pub duration_hours: f64,
    #[serde(default)]
    pub duration_minutes: f64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TimeEntryListQuery {
    /// Ignored for employees.
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    /// Defaults to seven days ago.
    pub start_date: Option<NaiveDate>,
    /// Defaults to today.
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeEntryListResponse {
    pub entries: Vec<TimeEntryResponse>,
    pub total_hours: f64,
    pub total_entries: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeEntryEnvelope {
    pub entry: TimeEntryResponse,
}

/// Body of a freshly started timer.
#[derive(Debug, Serialize, ToSchema)]
pub struct StartedTimerEnvelope {
    pub timer: TimeEntryResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveTimerResponse {
    #[serde(flatten)]
    pub entry: TimeEntryResponse,
    pub elapsed_seconds: i64,
    pub elapsed_formatted: String,
}

impl From<ActiveTimer> for ActiveTimerResponse {
    fn from(active: ActiveTimer) -> Self {
        Self {
            entry: active.timer.into(),
            elapsed_seconds: active.elapsed_seconds,
            elapsed_formatted: format_duration(active.elapsed_seconds / 60),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActiveTimerEnvelope {
    /// `null` when no timer is running.
    pub timer: Option<ActiveTimerResponse>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/time-entries - List entries with totals
#[utoipa::path(
    get,
    path = "/api/time-entries",
    tag = "time-entries",
    params(TimeEntryListQuery),
    responses(
        (status = 200, description = "Time entries", body = TimeEntryListResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_time_entries_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<TimeEntryListQuery>,
) -> ApiResult<Json<TimeEntryListResponse>> {
    let listing = state
        .services
        .timer
        .list(
            &viewer,
            TimeEntryFilter {
                user_id: query.user_id,
                project_id: query.project_id,
                start_date: query.start_date,
                end_date: query.end_date,
            },
        )
        .await?;
    Ok(Json(TimeEntryListResponse {
        entries: listing.entries.into_iter().map(Into::into).collect(),
        total_hours: listing.total_hours,
        total_entries: listing.total_entries,
    }))
}

/// POST /api/time-entries/start - Start a timer
#[utoipa::path(
    post,
    path = "/api/time-entries/start",
    tag = "time-entries",
    request_body = StartTimerRequest,
    responses(
        (status = 201, description = "Timer started", body = StartedTimerEnvelope),
        (status = 400, description = "Invalid task description", body = ErrorBody),
        (status = 403, description = "Not assigned to the project", body = ErrorBody),
        (status = 409, description = "Timer already running", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn start_timer_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<StartTimerRequest>,
) -> ApiResult<(StatusCode, Json<StartedTimerEnvelope>)> {
    let timer = state
        .services
        .timer
        .start(&viewer, req.project_id, req.task_description)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(StartedTimerEnvelope {
            timer: timer.into(),
        }),
    ))
}

/// PUT /api/time-entries/{id}/stop - Stop a running timer
#[utoipa::path(
    put,
    path = "/api/time-entries/{id}/stop",
    tag = "time-entries",
    params(("id" = Uuid, Path, description = "Time entry id")),
    responses(
        (status = 200, description = "Timer stopped", body = TimeEntryEnvelope),
        (status = 400, description = "Not a running timer", body = ErrorBody),
        (status = 403, description = "Not your time entry", body = ErrorBody),
        (status = 404, description = "Time entry not found", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn stop_timer_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TimeEntryEnvelope>> {
    let entry = state.services.timer.stop(&viewer, id).await?;
    Ok(Json(TimeEntryEnvelope {
        entry: entry.into(),
    }))
}

/// GET /api/time-entries/active - The caller's running timer
#[utoipa::path(
    get,
    path = "/api/time-entries/active",
    tag = "time-entries",
    responses(
        (status = 200, description = "Running timer or null", body = ActiveTimerEnvelope)
    ),
    security(("bearer" = []))
)]
pub async fn active_timer_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
) -> ApiResult<Json<ActiveTimerEnvelope>> {
    let active = state.services.timer.active(&viewer).await?;
    Ok(Json(ActiveTimerEnvelope {
        timer: active.map(Into::into),
    }))
}

/// POST /api/time-entries/manual - Log time without a timer
#[utoipa::path(
    post,
    path = "/api/time-entries/manual",
    tag = "time-entries",
    request_body = ManualEntryRequest,
    responses(
        (status = 201, description = "Entry created", body = TimeEntryEnvelope),
        (status = 400, description = "Invalid duration or date", body = ErrorBody),
        (status = 403, description = "Not assigned to the project", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn manual_entry_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<ManualEntryRequest>,
) -> ApiResult<(StatusCode, Json<TimeEntryEnvelope>)> {
    let entry = state
        .services
        .timer
        .add_manual(
            &viewer,
            ManualEntry {
                project_id: req.project_id,
                task_description: req.task_description,
                entry_date: req.entry_date,
                hours: req.duration_hours,
                minutes: req.duration_minutes,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(TimeEntryEnvelope {
            entry: entry.into(),
        }),
    ))
}
