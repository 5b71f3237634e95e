//! crates/timekeeper_core/src/projects.rs
//!
//! Project catalogue and assignment management.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::access_requests::AccessWorkflow;
use crate::clock::minutes_to_hours;
use crate::domain::{AccessRequest, ActivityFilter, Project, ProjectStatus, RequestStatus};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, DatabaseService, PortResult, RequestQuery, StoreTx, TimeEntryQuery};
use crate::validation::check_project_name;
use crate::viewer::Viewer;
use crate::workflow::{build_views, RequestView};

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    /// `"active"` (default) or `"inactive"`.
    pub status: Option<String>,
}

/// Partial update; `None` leaves a field untouched. An empty description clears it.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub project: Project,
    pub created_by_name: Option<String>,
    pub assigned_employees_count: usize,
}

#[derive(Debug, Clone)]
pub struct AssignedEmployee {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub assigned_at: DateTime<Utc>,
    /// Hours this employee logged on the project.
    pub total_hours: f64,
}

#[derive(Debug, Clone)]
pub struct ProjectDetail {
    pub project: Project,
    pub created_by_name: Option<String>,
    pub assigned_employees: Vec<AssignedEmployee>,
    pub total_hours_logged: f64,
    /// Only filled in for admins.
    pub pending_requests: Option<Vec<RequestView<AccessRequest>>>,
}

fn parse_status(value: &str) -> CoreResult<ProjectStatus> {
    value
        .parse()
        .map_err(|_| CoreError::validation("Status must be either active or inactive"))
}

async fn ensure_unique_name(
    tx: &mut dyn StoreTx,
    name: &str,
    exclude: Option<Uuid>,
) -> CoreResult<()> {
    match tx.get_project_by_name(name).await? {
        Some(existing) if Some(existing.id) != exclude => {
            Err(CoreError::conflict("Project name already exists"))
        }
        _ => Ok(()),
    }
}

/// Number of active projects the user is assigned to.
pub(crate) async fn count_active_assignments(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
) -> PortResult<usize> {
    let assignments = tx.list_assignments(None, Some(user_id)).await?;
    let mut count = 0;
    for assignment in assignments {
        if let Some(project) = tx.get_project(assignment.project_id).await? {
            if project.status == ProjectStatus::Active {
                count += 1;
            }
        }
    }
    Ok(count)
}

#[derive(Clone)]
pub struct ProjectService {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
}

impl ProjectService {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Employees only ever see active projects; admins choose.
    pub async fn list(
        &self,
        viewer: &Viewer,
        filter: ActivityFilter,
    ) -> CoreResult<Vec<ProjectSummary>> {
        let filter = if viewer.is_admin() {
            filter
        } else {
            ActivityFilter::Active
        };
        let status = match filter {
            ActivityFilter::Active => Some(ProjectStatus::Active),
            ActivityFilter::Inactive => Some(ProjectStatus::Inactive),
            ActivityFilter::All => None,
        };

        let mut tx = self.db.begin().await?;
        let projects = tx.list_projects(status).await?;
        let mut counts: HashMap<Uuid, usize> = HashMap::new();
        for assignment in tx.list_assignments(None, None).await? {
            *counts.entry(assignment.project_id).or_default() += 1;
        }
        let creators: Vec<Uuid> = projects.iter().map(|p| p.created_by).collect();
        let names = tx.user_names(&creators).await?;
        tx.commit().await?;

        Ok(projects
            .into_iter()
            .map(|project| ProjectSummary {
                created_by_name: names.get(&project.created_by).cloned(),
                assigned_employees_count: counts.get(&project.id).copied().unwrap_or_default(),
                project,
            })
            .collect())
    }

    pub async fn detail(&self, viewer: &Viewer, id: Uuid) -> CoreResult<ProjectDetail> {
        let mut tx = self.db.begin().await?;
        let project = tx
            .get_project(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project not found"))?;
        if !viewer.is_admin() && tx.get_assignment(id, viewer.user_id).await?.is_none() {
            return Err(CoreError::forbidden(
                "Access denied. You are not assigned to this project.",
            ));
        }

        let assignments = tx.list_assignments(Some(id), None).await?;
        let mut people: Vec<Uuid> = assignments.iter().map(|a| a.user_id).collect();
        people.push(project.created_by);
        let names = tx.user_names(&people).await?;

        let mut assigned_employees = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let minutes = tx
                .sum_duration_minutes(&TimeEntryQuery {
                    user_id: Some(assignment.user_id),
                    project_id: Some(id),
                    ..Default::default()
                })
                .await?;
            assigned_employees.push(AssignedEmployee {
                user_id: assignment.user_id,
                full_name: names.get(&assignment.user_id).cloned(),
                assigned_at: assignment.assigned_at,
                total_hours: minutes_to_hours(minutes),
            });
        }

        let total_minutes = tx
            .sum_duration_minutes(&TimeEntryQuery {
                project_id: Some(id),
                ..Default::default()
            })
            .await?;

        let pending_requests = if viewer.is_admin() {
            let pending = tx
                .list_access_requests(&RequestQuery {
                    status: Some(RequestStatus::Pending),
                    subject_id: Some(id),
                    ..Default::default()
                })
                .await?;
            Some(build_views(&AccessWorkflow, tx.as_mut(), pending).await?)
        } else {
            None
        };
        tx.commit().await?;

        Ok(ProjectDetail {
            created_by_name: names.get(&project.created_by).cloned(),
            project,
            assigned_employees,
            total_hours_logged: minutes_to_hours(total_minutes),
            pending_requests,
        })
    }

    pub async fn create(&self, viewer: &Viewer, input: NewProject) -> CoreResult<Project> {
        viewer.require_admin()?;
        let name = check_project_name(&input.name)?;
        let status = match input.status.as_deref() {
            Some(value) => parse_status(value)?,
            None => ProjectStatus::Active,
        };

        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        ensure_unique_name(tx.as_mut(), &name, None).await?;
        let project = Project {
            id: Uuid::new_v4(),
            name,
            description: input.description.filter(|d| !d.is_empty()),
            status,
            created_by: viewer.user_id,
            created_at: now,
            updated_at: now,
        };
        tx.insert_project(&project).await?;
        tx.commit().await?;

        info!(project_id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    pub async fn update(
        &self,
        viewer: &Viewer,
        id: Uuid,
        changes: ProjectChanges,
    ) -> CoreResult<Project> {
        viewer.require_admin()?;
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let mut project = tx
            .get_project(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project not found"))?;

        if changes.name.is_none() && changes.description.is_none() && changes.status.is_none() {
            return Err(CoreError::validation("No fields to update"));
        }
        if let Some(name) = changes.name {
            let name = check_project_name(&name)?;
            ensure_unique_name(tx.as_mut(), &name, Some(id)).await?;
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(status) = changes.status {
            project.status = parse_status(&status)?;
        }
        project.updated_at = now;
        tx.update_project(&project).await?;
        tx.commit().await?;

        info!(project_id = %id, status = project.status.as_str(), "project updated");
        Ok(project)
    }

    /// Revokes a user's assignment to a project.
    pub async fn remove_employee(
        &self,
        viewer: &Viewer,
        project_id: Uuid,
        user_id: Uuid,
    ) -> CoreResult<()> {
        viewer.require_admin()?;
        let mut tx = self.db.begin().await?;
        if !tx.delete_assignment(project_id, user_id).await? {
            return Err(CoreError::not_found("Assignment not found"));
        }
        tx.commit().await?;

        info!(project_id = %project_id, user_id = %user_id, "employee removed from project");
        Ok(())
    }
}
