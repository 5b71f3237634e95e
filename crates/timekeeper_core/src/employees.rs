//! crates/timekeeper_core/src/employees.rs
//!
//! Admin-side roster management: listing, details with work statistics,
//! creation, updates and soft deletion.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::accounts::{ensure_email_free, insert_user, normalize_email, UserDraft};
use crate::clock::{minutes_to_hours, start_of_month, start_of_week};
use crate::domain::{ActivityFilter, DailyReport, LocationRecord, Project, Role, User};
use crate::error::{CoreError, CoreResult};
use crate::ports::{
    Clock, CredentialHasher, DatabaseService, LocationQuery, ReportQuery, TimeEntryQuery,
    UserQuery,
};
use crate::projects::count_active_assignments;
use crate::timer::{entry_views, TimeEntryView};
use crate::validation::{check_full_name, check_password};
use crate::viewer::Viewer;

#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    pub status: ActivityFilter,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// `"employee"` (default) or `"admin"`.
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl EmployeeChanges {
    fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.full_name.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct EmployeeSummary {
    pub user: User,
    pub last_active: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeStats {
    pub hours_today: f64,
    pub hours_this_week: f64,
    pub hours_this_month: f64,
    pub active_projects: usize,
}

#[derive(Debug, Clone)]
pub struct AssignedProject {
    pub project: Project,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EmployeeDetail {
    pub user: User,
    pub stats: EmployeeStats,
    pub current_location: Option<LocationRecord>,
    pub recent_reports: Vec<DailyReport>,
    pub recent_time_entries: Vec<TimeEntryView>,
    pub assigned_projects: Vec<AssignedProject>,
}

fn parse_role(value: &str) -> CoreResult<Role> {
    value
        .parse()
        .map_err(|_| CoreError::validation("Role must be either admin or employee"))
}

#[derive(Clone)]
pub struct EmployeeService {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn CredentialHasher>,
}

impl EmployeeService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        clock: Arc<dyn Clock>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self { db, clock, hasher }
    }

    pub async fn list(
        &self,
        viewer: &Viewer,
        filter: EmployeeFilter,
    ) -> CoreResult<Vec<EmployeeSummary>> {
        viewer.require_admin()?;
        let query = UserQuery {
            active: match filter.status {
                ActivityFilter::Active => Some(true),
                ActivityFilter::Inactive => Some(false),
                ActivityFilter::All => None,
            },
            role: None,
            search: filter.search.filter(|s| !s.trim().is_empty()),
        };

        let mut tx = self.db.begin().await?;
        let users = tx.list_users(&query).await?;
        let mut summaries = Vec::with_capacity(users.len());
        for user in users {
            let last_active = tx.last_activity(user.id).await?;
            summaries.push(EmployeeSummary { user, last_active });
        }
        tx.commit().await?;
        Ok(summaries)
    }

    pub async fn detail(&self, viewer: &Viewer, id: Uuid) -> CoreResult<EmployeeDetail> {
        viewer.require_admin()?;
        let today = self.clock.today();
        let mut tx = self.db.begin().await?;
        let user = tx
            .get_user(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee not found"))?;

        let hours_since = |from| TimeEntryQuery {
            user_id: Some(id),
            from: Some(from),
            ..Default::default()
        };
        let today_minutes = tx
            .sum_duration_minutes(&TimeEntryQuery {
                to: Some(today),
                ..hours_since(today)
            })
            .await?;
        let week_minutes = tx.sum_duration_minutes(&hours_since(start_of_week(today))).await?;
        let month_minutes = tx.sum_duration_minutes(&hours_since(start_of_month(today))).await?;
        let active_projects = count_active_assignments(tx.as_mut(), id).await?;

        let current_location = tx
            .list_locations(&LocationQuery {
                user_id: Some(id),
                limit: Some(1),
                ..Default::default()
            })
            .await?
            .into_iter()
            .next();
        let recent_reports = tx
            .list_reports(&ReportQuery {
                user_id: Some(id),
                limit: Some(7),
                ..Default::default()
            })
            .await?;
        let entries = tx
            .list_time_entries(&TimeEntryQuery {
                user_id: Some(id),
                limit: Some(10),
                ..Default::default()
            })
            .await?;
        let recent_time_entries = entry_views(tx.as_mut(), entries).await?;

        let mut assigned_projects = Vec::new();
        for assignment in tx.list_assignments(None, Some(id)).await? {
            if let Some(project) = tx.get_project(assignment.project_id).await? {
                assigned_projects.push(AssignedProject {
                    project,
                    assigned_at: assignment.assigned_at,
                });
            }
        }
        tx.commit().await?;

        Ok(EmployeeDetail {
            user,
            stats: EmployeeStats {
                hours_today: minutes_to_hours(today_minutes),
                hours_this_week: minutes_to_hours(week_minutes),
                hours_this_month: minutes_to_hours(month_minutes),
                active_projects,
            },
            current_location,
            recent_reports,
            recent_time_entries,
            assigned_projects,
        })
    }

    pub async fn create(&self, viewer: &Viewer, input: NewEmployee) -> CoreResult<User> {
        viewer.require_admin()?;
        let email = normalize_email(&input.email)?;
        check_password(&input.password)?;
        check_full_name(&input.full_name)?;
        let role = match input.role.as_deref() {
            Some(value) => parse_role(value)?,
            None => Role::Employee,
        };

        let mut tx = self.db.begin().await?;
        let user = insert_user(
            tx.as_mut(),
            self.hasher.as_ref(),
            self.clock.as_ref(),
            UserDraft {
                email,
                password: input.password,
                full_name: input.full_name,
                role,
                is_active: input.is_active.unwrap_or(true),
            },
        )
        .await?;
        tx.commit().await?;

        info!(user_id = %user.id, created_by = %viewer.user_id, "employee created");
        Ok(user)
    }

    pub async fn update(
        &self,
        viewer: &Viewer,
        id: Uuid,
        changes: EmployeeChanges,
    ) -> CoreResult<User> {
        viewer.require_admin()?;
        let mut tx = self.db.begin().await?;
        let mut user = tx
            .get_user(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee not found"))?;
        if changes.is_empty() {
            return Err(CoreError::validation("No fields to update"));
        }

        if let Some(email) = changes.email {
            let email = normalize_email(&email)?;
            ensure_email_free(tx.as_mut(), &email, Some(id)).await?;
            user.email = email;
        }
        if let Some(password) = changes.password {
            check_password(&password)?;
            let hash = self.hasher.hash(&password)?;
            tx.set_password_hash(id, &hash).await?;
        }
        if let Some(full_name) = changes.full_name {
            check_full_name(&full_name)?;
            user.full_name = full_name.trim().to_string();
        }
        if let Some(role) = changes.role {
            user.role = parse_role(&role)?;
        }
        if let Some(is_active) = changes.is_active {
            user.is_active = is_active;
        }
        user.updated_at = self.clock.now();
        tx.update_user(&user).await?;
        tx.commit().await?;

        info!(user_id = %id, "employee updated");
        Ok(user)
    }

    /// Soft delete: the account stays but can no longer log in.
    pub async fn archive(&self, viewer: &Viewer, id: Uuid) -> CoreResult<()> {
        viewer.require_admin()?;
        if id == viewer.user_id {
            return Err(CoreError::validation("Cannot archive your own account"));
        }
        let mut tx = self.db.begin().await?;
        let mut user = tx
            .get_user(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Employee not found"))?;
        user.is_active = false;
        user.updated_at = self.clock.now();
        tx.update_user(&user).await?;
        tx.commit().await?;

        info!(user_id = %id, archived_by = %viewer.user_id, "employee archived");
        Ok(())
    }
}
