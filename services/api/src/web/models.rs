//! services/api/src/web/models.rs
//!
//! JSON shapes shared by several handler modules, converted from core types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use timekeeper_core::clock::format_duration;
use timekeeper_core::locations::LocationView;
use timekeeper_core::reports::ReportView;
use timekeeper_core::timer::TimeEntryView;
use timekeeper_core::{
    AccessRequest, DailyReport, Project, ReportEditRequest, RequestStatus, RequestView, User,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            status: project.status.as_str().to_string(),
            created_by: project.created_by,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessRequestResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub project_name: Option<String>,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub reviewed_by: Option<Uuid>,
    pub reviewer_name: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl From<RequestView<AccessRequest>> for AccessRequestResponse {
    fn from(view: RequestView<AccessRequest>) -> Self {
        let request = view.request;
        Self {
            id: request.id,
            project_id: request.project_id,
            project_name: view.subject_label,
            user_id: request.user_id,
            user_name: view.requester_name,
            status: request.review.status.as_str().to_string(),
            requested_at: request.requested_at,
            reviewed_by: request.review.reviewed_by,
            reviewer_name: view.reviewer_name,
            reviewed_at: request.review.reviewed_at,
            rejection_reason: request.review.rejection_reason,
        }
    }
}

impl From<AccessRequest> for AccessRequestResponse {
    fn from(request: AccessRequest) -> Self {
        RequestView {
            request,
            requester_name: None,
            reviewer_name: None,
            subject_label: None,
        }
        .into()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EditRequestResponse {
    pub id: Uuid,
    pub report_id: Uuid,
    /// Date of the report the request is about.
    pub report_date: Option<String>,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub reason: String,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub reviewed_by: Option<Uuid>,
    pub reviewer_name: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub edit_deadline: Option<DateTime<Utc>>,
}

impl From<RequestView<ReportEditRequest>> for EditRequestResponse {
    fn from(view: RequestView<ReportEditRequest>) -> Self {
        let request = view.request;
        Self {
            id: request.id,
            report_id: request.report_id,
            report_date: view.subject_label,
            user_id: request.user_id,
            user_name: view.requester_name,
            reason: request.reason,
            status: request.review.status.as_str().to_string(),
            requested_at: request.requested_at,
            reviewed_by: request.review.reviewed_by,
            reviewer_name: view.reviewer_name,
            reviewed_at: request.review.reviewed_at,
            rejection_reason: request.review.rejection_reason,
            edit_deadline: request.edit_deadline,
        }
    }
}

impl From<ReportEditRequest> for EditRequestResponse {
    fn from(request: ReportEditRequest) -> Self {
        RequestView {
            request,
            requester_name: None,
            reviewer_name: None,
            subject_label: None,
        }
        .into()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub report_date: NaiveDate,
    pub tasks_completed: Vec<String>,
    pub hours_worked: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportResponse {
    pub fn named(report: DailyReport, user_name: Option<String>) -> Self {
        Self {
            id: report.id,
            user_id: report.user_id,
            user_name,
            report_date: report.report_date,
            tasks_completed: report.tasks_completed,
            hours_worked: report.hours_worked,
            notes: report.notes,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

impl From<DailyReport> for ReportResponse {
    fn from(report: DailyReport) -> Self {
        Self::named(report, None)
    }
}

impl From<ReportView> for ReportResponse {
    fn from(view: ReportView) -> Self {
        Self::named(view.report, view.user_name)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimeEntryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub project_id: Uuid,
    pub project_name: Option<String>,
    pub task_description: String,
    pub entry_type: String,
    pub entry_date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    /// e.g. `"2 hours 5 minutes"`.
    pub duration_formatted: String,
    pub created_at: DateTime<Utc>,
}

impl From<TimeEntryView> for TimeEntryResponse {
    fn from(view: TimeEntryView) -> Self {
        let entry = view.entry;
        Self {
            id: entry.id,
            user_id: entry.user_id,
            user_name: view.user_name,
            project_id: entry.project_id,
            project_name: view.project_name,
            task_description: entry.task_description,
            entry_type: entry.entry_type.as_str().to_string(),
            entry_date: entry.entry_date,
            start_time: entry.start_time,
            end_time: entry.end_time,
            duration_minutes: entry.duration_minutes,
            duration_formatted: format_duration(entry.duration_minutes),
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl From<LocationView> for LocationResponse {
    fn from(view: LocationView) -> Self {
        let record = view.record;
        Self {
            id: record.id,
            user_id: record.user_id,
            user_name: view.user_name,
            latitude: record.latitude,
            longitude: record.longitude,
            accuracy: record.accuracy,
            status: record.status.as_str().to_string(),
            timestamp: record.timestamp,
        }
    }
}

/// `?status=` for the request listings: `pending`, `approved`, `rejected` or `all`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RequestListQuery {
    pub status: Option<String>,
}

impl RequestListQuery {
    /// The status filter, falling back to `default` when the parameter is absent.
    pub fn status_filter(
        &self,
        default: Option<RequestStatus>,
    ) -> ApiResult<Option<RequestStatus>> {
        match self.status.as_deref() {
            None => Ok(default),
            Some("all") => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| {
                ApiError::bad_request("Status must be one of pending, approved, rejected, all")
            }),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_status_filter_defaults_and_all() {
        let absent = RequestListQuery::default();
        assert_eq!(
            absent.status_filter(Some(RequestStatus::Pending)).unwrap(),
            Some(RequestStatus::Pending)
        );
        assert_eq!(absent.status_filter(None).unwrap(), None);

        let all = RequestListQuery {
            status: Some("all".to_string()),
        };
        assert_eq!(all.status_filter(Some(RequestStatus::Pending)).unwrap(), None);

        let approved = RequestListQuery {
            status: Some("approved".to_string()),
        };
        assert_eq!(
            approved.status_filter(None).unwrap(),
            Some(RequestStatus::Approved)
        );

        let bogus = RequestListQuery {
            status: Some("maybe".to_string()),
        };
        assert!(bogus.status_filter(None).is_err());
    }
}
