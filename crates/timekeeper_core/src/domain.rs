//! crates/timekeeper_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Returned when a stored or submitted string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A person known to the system. Never hard-deleted; archiving clears `is_active`.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

//=========================================================================================
// Projects
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectStatus {
    Active,
    Inactive,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProjectStatus::Active),
            "inactive" => Ok(ProjectStatus::Inactive),
            other => Err(UnknownVariant::new("project status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Durable (project, user) access record, created by an approved access request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectAssignment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

//=========================================================================================
// Approval Requests
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(UnknownVariant::new("request status", other)),
        }
    }
}

/// Review state shared by every request that goes through the approval workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub status: RequestStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
}

impl Review {
    pub fn pending() -> Self {
        Self {
            status: RequestStatus::Pending,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// An employee asking to be assigned to a project.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessRequest {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub requested_at: DateTime<Utc>,
    pub review: Review,
}

/// An employee asking for permission to change an already submitted report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEditRequest {
    pub id: Uuid,
    pub report_id: Uuid,
    pub user_id: Uuid,
    pub reason: String,
    pub requested_at: DateTime<Utc>,
    pub review: Review,
    /// Set on approval; the grant is usable strictly before this instant.
    pub edit_deadline: Option<DateTime<Utc>>,
}

impl ReportEditRequest {
    /// An approved request whose deadline has not passed.
    pub fn is_active_grant(&self, now: DateTime<Utc>) -> bool {
        self.review.status == RequestStatus::Approved
            && self.edit_deadline.is_some_and(|deadline| deadline > now)
    }
}

//=========================================================================================
// Daily Reports
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub report_date: NaiveDate,
    pub tasks_completed: Vec<String>,
    pub hours_worked: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Time Entries
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Timer,
    Manual,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Timer => "timer",
            EntryType::Manual => "manual",
        }
    }
}

impl FromStr for EntryType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timer" => Ok(EntryType::Timer),
            "manual" => Ok(EntryType::Manual),
            other => Err(UnknownVariant::new("entry type", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub task_description: String,
    pub entry_type: EntryType,
    pub entry_date: NaiveDate,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntry {
    /// A timer entry that has not been stopped yet.
    pub fn is_open_timer(&self) -> bool {
        self.entry_type == EntryType::Timer && self.end_time.is_none()
    }
}

//=========================================================================================
// Locations
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationStatus {
    Active,
    Paused,
}

impl LocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationStatus::Active => "active",
            LocationStatus::Paused => "paused",
        }
    }
}

impl FromStr for LocationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LocationStatus::Active),
            "paused" => Ok(LocationStatus::Paused),
            other => Err(UnknownVariant::new("location status", other)),
        }
    }
}

/// One GPS sample. Append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub status: LocationStatus,
    pub timestamp: DateTime<Utc>,
}

//=========================================================================================
// Listing Filters
//=========================================================================================

/// Listing filter over an active/inactive state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityFilter {
    #[default]
    Active,
    Inactive,
    All,
}

impl FromStr for ActivityFilter {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ActivityFilter::Active),
            "inactive" => Ok(ActivityFilter::Inactive),
            "all" => Ok(ActivityFilter::All),
            other => Err(UnknownVariant::new("status filter", other)),
        }
    }
}
