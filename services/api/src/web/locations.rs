//! services/api/src/web/locations.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timekeeper_core::locations::{LocationFilter, LocationView, NewLocation};
use timekeeper_core::Viewer;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiResult, ErrorBody};
use crate::web::models::LocationResponse;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct RecordLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    /// `active` (default) or `paused`.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocationListQuery {
    /// Ignored for employees.
    pub user_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LatestLocationQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationEnvelope {
    pub location: LocationResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationListResponse {
    pub locations: Vec<LocationResponse>,
}

/// POST /api/locations - Record the caller's position
#[utoipa::path(
    post,
    path = "/api/locations",
    tag = "locations",
    request_body = RecordLocationRequest,
    responses(
        (status = 201, description = "Location recorded", body = LocationEnvelope),
        (status = 400, description = "Invalid coordinates or status", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn record_location_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<RecordLocationRequest>,
) -> ApiResult<(StatusCode, Json<LocationEnvelope>)> {
    let record = state
        .services
        .locations
        .record(
            &viewer,
            NewLocation {
                latitude: req.latitude,
                longitude: req.longitude,
                accuracy: req.accuracy,
                status: req.status,
            },
        )
        .await?;
    let view = LocationView {
        record,
        user_name: None,
    };
    Ok((
        StatusCode::CREATED,
        Json(LocationEnvelope {
            location: view.into(),
        }),
    ))
}

/// GET /api/locations - Location history, whole days, newest first
#[utoipa::path(
    get,
    path = "/api/locations",
    tag = "locations",
    params(LocationListQuery),
    responses(
        (status = 200, description = "Location records", body = LocationListResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_locations_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<LocationListQuery>,
) -> ApiResult<Json<LocationListResponse>> {
    let views = state
        .services
        .locations
        .list(
            &viewer,
            LocationFilter {
                user_id: query.user_id,
                start_date: query.start_date,
                end_date: query.end_date,
            },
        )
        .await?;
    Ok(Json(LocationListResponse {
        locations: views.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/locations/latest - Most recent position per employee (admin)
#[utoipa::path(
    get,
    path = "/api/locations/latest",
    tag = "locations",
    params(LatestLocationQuery),
    responses(
        (status = 200, description = "Latest locations", body = LocationListResponse),
        (status = 403, description = "Admin privileges required", body = ErrorBody)
    ),
    security(("bearer" = []))
)]
pub async fn latest_locations_handler(
    State(state): State<Arc<AppState>>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<LatestLocationQuery>,
) -> ApiResult<Json<LocationListResponse>> {
    let views = state
        .services
        .locations
        .latest(&viewer, query.user_id)
        .await?;
    Ok(Json(LocationListResponse {
        locations: views.into_iter().map(Into::into).collect(),
    }))
}
