//! crates/timekeeper_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete database, clock and password hashing.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{
    AccessRequest, DailyReport, LocationRecord, Project, ProjectAssignment, ProjectStatus,
    ReportEditRequest, RequestStatus, Role, TimeEntry, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint of the store rejected the write.
    #[error("Conflicting record: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Query Filters
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub active: Option<bool>,
    pub role: Option<Role>,
    /// Case-insensitive substring matched against full name and email.
    pub search: Option<String>,
}

/// Filter shared by both request tables. `subject_id` is the project for access
/// requests and the report for edit requests.
#[derive(Debug, Clone, Default)]
pub struct RequestQuery {
    pub status: Option<RequestStatus>,
    pub user_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    pub user_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct TimeEntryQuery {
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Skip entries without an end time (open timers).
    pub completed_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct LocationQuery {
    pub user_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

//=========================================================================================
// Store Ports (Traits)
//=========================================================================================

/// Entry point to the transactional store.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    /// Opens a unit of work. Dropping the returned transaction without calling
    /// [`StoreTx::commit`] discards every write made through it.
    async fn begin(&self) -> PortResult<Box<dyn StoreTx>>;
}

/// A single unit of work against the store.
///
/// List methods return newest-first orderings:
/// users and projects by `created_at`, assignments by `assigned_at`, requests by
/// `requested_at`, reports by `report_date` then `created_at`, time entries by
/// `entry_date` then `created_at`, locations by `timestamp`.
#[async_trait]
pub trait StoreTx: Send {
    async fn commit(self: Box<Self>) -> PortResult<()>;

    // --- Users ---
    async fn count_users(&mut self) -> PortResult<i64>;

    async fn insert_user(&mut self, user: &User, password_hash: &str) -> PortResult<()>;

    async fn get_user(&mut self, id: Uuid) -> PortResult<Option<User>>;

    async fn get_credentials_by_email(&mut self, email: &str)
        -> PortResult<Option<UserCredentials>>;

    async fn update_user(&mut self, user: &User) -> PortResult<()>;

    async fn set_password_hash(&mut self, user_id: Uuid, password_hash: &str) -> PortResult<()>;

    async fn list_users(&mut self, query: &UserQuery) -> PortResult<Vec<User>>;

    async fn user_names(&mut self, ids: &[Uuid]) -> PortResult<HashMap<Uuid, String>>;

    /// Latest of the user's location timestamps and time entry creation times.
    async fn last_activity(&mut self, user_id: Uuid) -> PortResult<Option<DateTime<Utc>>>;

    // --- Projects ---
    async fn insert_project(&mut self, project: &Project) -> PortResult<()>;

    async fn get_project(&mut self, id: Uuid) -> PortResult<Option<Project>>;

    async fn get_project_by_name(&mut self, name: &str) -> PortResult<Option<Project>>;

    async fn update_project(&mut self, project: &Project) -> PortResult<()>;

    async fn list_projects(&mut self, status: Option<ProjectStatus>) -> PortResult<Vec<Project>>;

    async fn project_names(&mut self, ids: &[Uuid]) -> PortResult<HashMap<Uuid, String>>;

    // --- Assignments ---
    async fn get_assignment(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<ProjectAssignment>>;

    /// Inserts the assignment unless one already exists for the pair.
    /// Returns `false` when nothing was written.
    async fn insert_assignment(&mut self, assignment: &ProjectAssignment) -> PortResult<bool>;

    async fn delete_assignment(&mut self, project_id: Uuid, user_id: Uuid) -> PortResult<bool>;

    async fn list_assignments(
        &mut self,
        project_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> PortResult<Vec<ProjectAssignment>>;

    // --- Project Access Requests ---
    async fn insert_access_request(&mut self, request: &AccessRequest) -> PortResult<()>;

    /// Reads the request and holds it against concurrent review until commit.
    async fn lock_access_request(&mut self, id: Uuid) -> PortResult<Option<AccessRequest>>;

    async fn update_access_request(&mut self, request: &AccessRequest) -> PortResult<()>;

    async fn list_access_requests(&mut self, query: &RequestQuery)
        -> PortResult<Vec<AccessRequest>>;

    // --- Report Edit Requests ---
    async fn insert_edit_request(&mut self, request: &ReportEditRequest) -> PortResult<()>;

    async fn lock_edit_request(&mut self, id: Uuid) -> PortResult<Option<ReportEditRequest>>;

    async fn update_edit_request(&mut self, request: &ReportEditRequest) -> PortResult<()>;

    async fn delete_edit_request(&mut self, id: Uuid) -> PortResult<()>;

    async fn list_edit_requests(
        &mut self,
        query: &RequestQuery,
    ) -> PortResult<Vec<ReportEditRequest>>;

    // --- Daily Reports ---
    async fn insert_report(&mut self, report: &DailyReport) -> PortResult<()>;

    async fn get_report(&mut self, id: Uuid) -> PortResult<Option<DailyReport>>;

    async fn update_report(&mut self, report: &DailyReport) -> PortResult<()>;

    async fn list_reports(&mut self, query: &ReportQuery) -> PortResult<Vec<DailyReport>>;

    // --- Time Entries ---
    async fn insert_time_entry(&mut self, entry: &TimeEntry) -> PortResult<()>;

    async fn lock_time_entry(&mut self, id: Uuid) -> PortResult<Option<TimeEntry>>;

    async fn find_open_timer(&mut self, user_id: Uuid) -> PortResult<Option<TimeEntry>>;

    async fn update_time_entry(&mut self, entry: &TimeEntry) -> PortResult<()>;

    async fn list_time_entries(&mut self, query: &TimeEntryQuery) -> PortResult<Vec<TimeEntry>>;

    async fn sum_duration_minutes(&mut self, query: &TimeEntryQuery) -> PortResult<i64>;

    // --- Locations ---
    async fn insert_location(&mut self, record: &LocationRecord) -> PortResult<()>;

    async fn list_locations(&mut self, query: &LocationQuery) -> PortResult<Vec<LocationRecord>>;

    /// The most recent record of every user (or of one user when given).
    async fn latest_locations(&mut self, user_id: Option<Uuid>)
        -> PortResult<Vec<LocationRecord>>;
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Turns plain passwords into stored hashes and checks them back.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> PortResult<String>;

    fn verify(&self, password: &str, password_hash: &str) -> bool;
}
