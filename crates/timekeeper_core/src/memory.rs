//! crates/timekeeper_core/src/memory.rs
//!
//! An in-process implementation of the store ports. Transactions are serialized
//! behind one async mutex and work on a private copy of the state, so an
//! uncommitted transaction leaves nothing behind. The uniqueness rules mirror the
//! constraints of the SQL schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{
    AccessRequest, DailyReport, LocationRecord, Project, ProjectAssignment, ProjectStatus,
    ReportEditRequest, TimeEntry, User, UserCredentials,
};
use crate::ports::{
    DatabaseService, LocationQuery, PortError, PortResult, ReportQuery, RequestQuery, StoreTx,
    TimeEntryQuery, UserQuery,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<UserCredentials>,
    projects: Vec<Project>,
    assignments: Vec<ProjectAssignment>,
    access_requests: Vec<AccessRequest>,
    edit_requests: Vec<ReportEditRequest>,
    reports: Vec<DailyReport>,
    time_entries: Vec<TimeEntry>,
    locations: Vec<LocationRecord>,
}

/// Store kept entirely in memory. Cloning shares the underlying state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    failures: Arc<StdMutex<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call of the named store operation fail with
    /// [`PortError::Unexpected`], until [`MemoryStore::clear_failures`].
    pub fn inject_failure(&self, operation: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(operation.to_string());
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.clear();
        }
    }
}

#[async_trait]
impl DatabaseService for MemoryStore {
    async fn begin(&self) -> PortResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            working,
            failures: self.failures.clone(),
        }))
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    failures: Arc<StdMutex<HashSet<String>>>,
}

impl MemoryTx {
    fn check(&self, operation: &str) -> PortResult<()> {
        let failing = self
            .failures
            .lock()
            .map(|failures| failures.contains(operation))
            .unwrap_or(false);
        if failing {
            return Err(PortError::Unexpected(format!(
                "injected failure in {operation}"
            )));
        }
        Ok(())
    }
}

fn newest_first<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn take<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

fn replace<T>(items: &mut [T], id: Uuid, id_of: impl Fn(&T) -> Uuid, value: T, kind: &str) -> PortResult<()> {
    match items.iter_mut().find(|item| id_of(item) == id) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(PortError::NotFound(format!("{kind} {id}"))),
    }
}

fn request_matches(
    query: &RequestQuery,
    status: crate::domain::RequestStatus,
    user_id: Uuid,
    subject_id: Uuid,
) -> bool {
    query.status.map_or(true, |s| s == status)
        && query.user_id.map_or(true, |u| u == user_id)
        && query.subject_id.map_or(true, |s| s == subject_id)
}

fn entry_matches(query: &TimeEntryQuery, entry: &TimeEntry) -> bool {
    query.user_id.map_or(true, |u| u == entry.user_id)
        && query.project_id.map_or(true, |p| p == entry.project_id)
        && query.from.map_or(true, |from| entry.entry_date >= from)
        && query.to.map_or(true, |to| entry.entry_date <= to)
        && !(query.completed_only && entry.is_open_timer())
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(self: Box<Self>) -> PortResult<()> {
        self.check("commit")?;
        let MemoryTx {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    // --- Users ---

    async fn count_users(&mut self) -> PortResult<i64> {
        self.check("count_users")?;
        Ok(self.working.users.len() as i64)
    }

    async fn insert_user(&mut self, user: &User, password_hash: &str) -> PortResult<()> {
        self.check("insert_user")?;
        if self.working.users.iter().any(|c| c.user.email == user.email) {
            return Err(PortError::Conflict("users_email_key".to_string()));
        }
        self.working.users.push(UserCredentials {
            user: user.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(())
    }

    async fn get_user(&mut self, id: Uuid) -> PortResult<Option<User>> {
        self.check("get_user")?;
        Ok(self
            .working
            .users
            .iter()
            .find(|c| c.user.id == id)
            .map(|c| c.user.clone()))
    }

    async fn get_credentials_by_email(
        &mut self,
        email: &str,
    ) -> PortResult<Option<UserCredentials>> {
        self.check("get_credentials_by_email")?;
        Ok(self
            .working
            .users
            .iter()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn update_user(&mut self, user: &User) -> PortResult<()> {
        self.check("update_user")?;
        if self
            .working
            .users
            .iter()
            .any(|c| c.user.email == user.email && c.user.id != user.id)
        {
            return Err(PortError::Conflict("users_email_key".to_string()));
        }
        let slot = self
            .working
            .users
            .iter_mut()
            .find(|c| c.user.id == user.id)
            .ok_or_else(|| PortError::NotFound(format!("user {}", user.id)))?;
        slot.user = user.clone();
        Ok(())
    }

    async fn set_password_hash(&mut self, user_id: Uuid, password_hash: &str) -> PortResult<()> {
        self.check("set_password_hash")?;
        let slot = self
            .working
            .users
            .iter_mut()
            .find(|c| c.user.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("user {user_id}")))?;
        slot.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn list_users(&mut self, query: &UserQuery) -> PortResult<Vec<User>> {
        self.check("list_users")?;
        let needle = query.search.as_ref().map(|s| s.trim().to_lowercase());
        let mut users: Vec<User> = self
            .working
            .users
            .iter()
            .map(|c| &c.user)
            .filter(|u| query.active.map_or(true, |a| u.is_active == a))
            .filter(|u| query.role.map_or(true, |r| u.role == r))
            .filter(|u| {
                needle.as_ref().map_or(true, |n| {
                    u.full_name.to_lowercase().contains(n) || u.email.to_lowercase().contains(n)
                })
            })
            .cloned()
            .collect();
        newest_first(&mut users, |u| u.created_at);
        Ok(users)
    }

    async fn user_names(&mut self, ids: &[Uuid]) -> PortResult<HashMap<Uuid, String>> {
        self.check("user_names")?;
        Ok(self
            .working
            .users
            .iter()
            .filter(|c| ids.contains(&c.user.id))
            .map(|c| (c.user.id, c.user.full_name.clone()))
            .collect())
    }

    async fn last_activity(&mut self, user_id: Uuid) -> PortResult<Option<DateTime<Utc>>> {
        self.check("last_activity")?;
        let seen = self
            .working
            .locations
            .iter()
            .filter(|l| l.user_id == user_id)
            .map(|l| l.timestamp);
        let worked = self
            .working
            .time_entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.created_at);
        Ok(seen.chain(worked).max())
    }

    // --- Projects ---

    async fn insert_project(&mut self, project: &Project) -> PortResult<()> {
        self.check("insert_project")?;
        if self.working.projects.iter().any(|p| p.name == project.name) {
            return Err(PortError::Conflict("projects_name_key".to_string()));
        }
        self.working.projects.push(project.clone());
        Ok(())
    }

    async fn get_project(&mut self, id: Uuid) -> PortResult<Option<Project>> {
        self.check("get_project")?;
        Ok(self.working.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn get_project_by_name(&mut self, name: &str) -> PortResult<Option<Project>> {
        self.check("get_project_by_name")?;
        Ok(self
            .working
            .projects
            .iter()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn update_project(&mut self, project: &Project) -> PortResult<()> {
        self.check("update_project")?;
        if self
            .working
            .projects
            .iter()
            .any(|p| p.name == project.name && p.id != project.id)
        {
            return Err(PortError::Conflict("projects_name_key".to_string()));
        }
        replace(
            &mut self.working.projects,
            project.id,
            |p| p.id,
            project.clone(),
            "project",
        )
    }

    async fn list_projects(&mut self, status: Option<ProjectStatus>) -> PortResult<Vec<Project>> {
        self.check("list_projects")?;
        let mut projects: Vec<Project> = self
            .working
            .projects
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        newest_first(&mut projects, |p| p.created_at);
        Ok(projects)
    }

    async fn project_names(&mut self, ids: &[Uuid]) -> PortResult<HashMap<Uuid, String>> {
        self.check("project_names")?;
        Ok(self
            .working
            .projects
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| (p.id, p.name.clone()))
            .collect())
    }

    // --- Assignments ---

    async fn get_assignment(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<ProjectAssignment>> {
        self.check("get_assignment")?;
        Ok(self
            .working
            .assignments
            .iter()
            .find(|a| a.project_id == project_id && a.user_id == user_id)
            .cloned())
    }

    async fn insert_assignment(&mut self, assignment: &ProjectAssignment) -> PortResult<bool> {
        self.check("insert_assignment")?;
        if self
            .working
            .assignments
            .iter()
            .any(|a| a.project_id == assignment.project_id && a.user_id == assignment.user_id)
        {
            return Ok(false);
        }
        self.working.assignments.push(assignment.clone());
        Ok(true)
    }

    async fn delete_assignment(&mut self, project_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        self.check("delete_assignment")?;
        let before = self.working.assignments.len();
        self.working
            .assignments
            .retain(|a| !(a.project_id == project_id && a.user_id == user_id));
        Ok(self.working.assignments.len() != before)
    }

    async fn list_assignments(
        &mut self,
        project_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> PortResult<Vec<ProjectAssignment>> {
        self.check("list_assignments")?;
        let mut assignments: Vec<ProjectAssignment> = self
            .working
            .assignments
            .iter()
            .filter(|a| project_id.map_or(true, |p| a.project_id == p))
            .filter(|a| user_id.map_or(true, |u| a.user_id == u))
            .cloned()
            .collect();
        newest_first(&mut assignments, |a| a.assigned_at);
        Ok(assignments)
    }

    // --- Project Access Requests ---

    async fn insert_access_request(&mut self, request: &AccessRequest) -> PortResult<()> {
        self.check("insert_access_request")?;
        if request.review.is_pending()
            && self.working.access_requests.iter().any(|r| {
                r.review.is_pending()
                    && r.project_id == request.project_id
                    && r.user_id == request.user_id
            })
        {
            return Err(PortError::Conflict(
                "project_access_requests_one_pending".to_string(),
            ));
        }
        self.working.access_requests.push(request.clone());
        Ok(())
    }

    async fn lock_access_request(&mut self, id: Uuid) -> PortResult<Option<AccessRequest>> {
        self.check("lock_access_request")?;
        Ok(self
            .working
            .access_requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn update_access_request(&mut self, request: &AccessRequest) -> PortResult<()> {
        self.check("update_access_request")?;
        replace(
            &mut self.working.access_requests,
            request.id,
            |r| r.id,
            request.clone(),
            "access request",
        )
    }

    async fn list_access_requests(
        &mut self,
        query: &RequestQuery,
    ) -> PortResult<Vec<AccessRequest>> {
        self.check("list_access_requests")?;
        let mut requests: Vec<AccessRequest> = self
            .working
            .access_requests
            .iter()
            .filter(|r| request_matches(query, r.review.status, r.user_id, r.project_id))
            .cloned()
            .collect();
        newest_first(&mut requests, |r| r.requested_at);
        Ok(take(requests, query.limit))
    }

    // --- Report Edit Requests ---

    async fn insert_edit_request(&mut self, request: &ReportEditRequest) -> PortResult<()> {
        self.check("insert_edit_request")?;
        if request.review.is_pending()
            && self
                .working
                .edit_requests
                .iter()
                .any(|r| r.review.is_pending() && r.report_id == request.report_id)
        {
            return Err(PortError::Conflict(
                "report_edit_requests_one_pending".to_string(),
            ));
        }
        self.working.edit_requests.push(request.clone());
        Ok(())
    }

    async fn lock_edit_request(&mut self, id: Uuid) -> PortResult<Option<ReportEditRequest>> {
        self.check("lock_edit_request")?;
        Ok(self
            .working
            .edit_requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn update_edit_request(&mut self, request: &ReportEditRequest) -> PortResult<()> {
        self.check("update_edit_request")?;
        replace(
            &mut self.working.edit_requests,
            request.id,
            |r| r.id,
            request.clone(),
            "edit request",
        )
    }

    async fn delete_edit_request(&mut self, id: Uuid) -> PortResult<()> {
        self.check("delete_edit_request")?;
        self.working.edit_requests.retain(|r| r.id != id);
        Ok(())
    }

    async fn list_edit_requests(
        &mut self,
        query: &RequestQuery,
    ) -> PortResult<Vec<ReportEditRequest>> {
        self.check("list_edit_requests")?;
        let mut requests: Vec<ReportEditRequest> = self
            .working
            .edit_requests
            .iter()
            .filter(|r| request_matches(query, r.review.status, r.user_id, r.report_id))
            .cloned()
            .collect();
        newest_first(&mut requests, |r| r.requested_at);
        Ok(take(requests, query.limit))
    }

    // --- Daily Reports ---

    async fn insert_report(&mut self, report: &DailyReport) -> PortResult<()> {
        self.check("insert_report")?;
        if self
            .working
            .reports
            .iter()
            .any(|r| r.user_id == report.user_id && r.report_date == report.report_date)
        {
            return Err(PortError::Conflict(
                "daily_reports_user_id_report_date_key".to_string(),
            ));
        }
        self.working.reports.push(report.clone());
        Ok(())
    }

    async fn get_report(&mut self, id: Uuid) -> PortResult<Option<DailyReport>> {
        self.check("get_report")?;
        Ok(self.working.reports.iter().find(|r| r.id == id).cloned())
    }

    async fn update_report(&mut self, report: &DailyReport) -> PortResult<()> {
        self.check("update_report")?;
        replace(
            &mut self.working.reports,
            report.id,
            |r| r.id,
            report.clone(),
            "report",
        )
    }

    async fn list_reports(&mut self, query: &ReportQuery) -> PortResult<Vec<DailyReport>> {
        self.check("list_reports")?;
        let mut reports: Vec<DailyReport> = self
            .working
            .reports
            .iter()
            .filter(|r| query.user_id.map_or(true, |u| r.user_id == u))
            .filter(|r| query.from.map_or(true, |from| r.report_date >= from))
            .filter(|r| query.to.map_or(true, |to| r.report_date <= to))
            .cloned()
            .collect();
        newest_first(&mut reports, |r| (r.report_date, r.created_at));
        Ok(take(reports, query.limit))
    }

    // --- Time Entries ---

    async fn insert_time_entry(&mut self, entry: &TimeEntry) -> PortResult<()> {
        self.check("insert_time_entry")?;
        if entry.is_open_timer()
            && self
                .working
                .time_entries
                .iter()
                .any(|e| e.user_id == entry.user_id && e.is_open_timer())
        {
            return Err(PortError::Conflict("time_entries_one_open_timer".to_string()));
        }
        self.working.time_entries.push(entry.clone());
        Ok(())
    }

    async fn lock_time_entry(&mut self, id: Uuid) -> PortResult<Option<TimeEntry>> {
        self.check("lock_time_entry")?;
        Ok(self
            .working
            .time_entries
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn find_open_timer(&mut self, user_id: Uuid) -> PortResult<Option<TimeEntry>> {
        self.check("find_open_timer")?;
        Ok(self
            .working
            .time_entries
            .iter()
            .find(|e| e.user_id == user_id && e.is_open_timer())
            .cloned())
    }

    async fn update_time_entry(&mut self, entry: &TimeEntry) -> PortResult<()> {
        self.check("update_time_entry")?;
        replace(
            &mut self.working.time_entries,
            entry.id,
            |e| e.id,
            entry.clone(),
            "time entry",
        )
    }

    async fn list_time_entries(&mut self, query: &TimeEntryQuery) -> PortResult<Vec<TimeEntry>> {
        self.check("list_time_entries")?;
        let mut entries: Vec<TimeEntry> = self
            .working
            .time_entries
            .iter()
            .filter(|e| entry_matches(query, e))
            .cloned()
            .collect();
        newest_first(&mut entries, |e| (e.entry_date, e.created_at));
        Ok(take(entries, query.limit))
    }

    async fn sum_duration_minutes(&mut self, query: &TimeEntryQuery) -> PortResult<i64> {
        self.check("sum_duration_minutes")?;
        Ok(self
            .working
            .time_entries
            .iter()
            .filter(|e| entry_matches(query, e))
            .map(|e| e.duration_minutes)
            .sum())
    }

    // --- Locations ---

    async fn insert_location(&mut self, record: &LocationRecord) -> PortResult<()> {
        self.check("insert_location")?;
        self.working.locations.push(record.clone());
        Ok(())
    }

    async fn list_locations(&mut self, query: &LocationQuery) -> PortResult<Vec<LocationRecord>> {
        self.check("list_locations")?;
        let mut records: Vec<LocationRecord> = self
            .working
            .locations
            .iter()
            .filter(|l| query.user_id.map_or(true, |u| l.user_id == u))
            .filter(|l| query.from.map_or(true, |from| l.timestamp >= from))
            .filter(|l| query.to.map_or(true, |to| l.timestamp <= to))
            .cloned()
            .collect();
        newest_first(&mut records, |l| l.timestamp);
        Ok(take(records, query.limit))
    }

    async fn latest_locations(
        &mut self,
        user_id: Option<Uuid>,
    ) -> PortResult<Vec<LocationRecord>> {
        self.check("latest_locations")?;
        let mut latest: HashMap<Uuid, &LocationRecord> = HashMap::new();
        for record in &self.working.locations {
            if user_id.is_some_and(|u| u != record.user_id) {
                continue;
            }
            match latest.get(&record.user_id) {
                Some(current) if current.timestamp >= record.timestamp => {}
                _ => {
                    latest.insert(record.user_id, record);
                }
            }
        }
        let mut records: Vec<LocationRecord> = latest.into_values().cloned().collect();
        newest_first(&mut records, |l| l.timestamp);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: "Test".to_string(),
            role: Role::Employee,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_user(&user("a@example.com"), "hash").await.unwrap();
        }
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user("a@example.com"), "hash").await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.count_users().await.unwrap(), 1);
        let err = tx
            .insert_user(&user("a@example.com"), "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));
    }

    #[tokio::test]
    async fn injected_failure_hits_named_operation() {
        let store = MemoryStore::new();
        store.inject_failure("count_users");
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.count_users().await,
            Err(PortError::Unexpected(_))
        ));
        store.clear_failures();
        assert_eq!(tx.count_users().await.unwrap(), 0);
    }
}
