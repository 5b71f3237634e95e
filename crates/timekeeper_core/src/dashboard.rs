//! crates/timekeeper_core/src/dashboard.rs
//!
//! Read-only rollups for the two landing pages.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::access_requests::AccessWorkflow;
use crate::clock::{minutes_to_hours, start_of_month, start_of_week};
use crate::domain::{
    AccessRequest, DailyReport, ProjectStatus, ReportEditRequest, RequestStatus, Role,
};
use crate::edit_requests::EditWorkflow;
use crate::error::CoreResult;
use crate::ports::{Clock, DatabaseService, ReportQuery, RequestQuery, TimeEntryQuery, UserQuery};
use crate::projects::count_active_assignments;
use crate::timer::{entry_views, load_active_timer, ActiveTimer, TimeEntryView};
use crate::viewer::Viewer;
use crate::workflow::{build_views, RequestView};

const RECENT_ACTIVITY_LIMIT: usize = 20;
const PENDING_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct AdminStats {
    pub total_employees: usize,
    pub active_projects: usize,
    /// Pending access requests plus pending edit requests.
    pub pending_requests: usize,
    pub reports_today: usize,
}

#[derive(Debug, Clone)]
pub struct EmployeeActivity {
    pub user_id: Uuid,
    pub full_name: String,
    pub last_active: Option<DateTime<Utc>>,
    /// Latitude and longitude of the most recent location record.
    pub current_location: Option<(f64, f64)>,
    pub hours_today: f64,
}

#[derive(Debug, Clone)]
pub struct AdminDashboard {
    pub stats: AdminStats,
    pub recent_activity: Vec<EmployeeActivity>,
    pub pending_access_requests: Vec<RequestView<AccessRequest>>,
    pub pending_edit_requests: Vec<RequestView<ReportEditRequest>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeDashboardStats {
    pub hours_today: f64,
    pub hours_this_week: f64,
    pub active_projects: usize,
    pub reports_this_month: usize,
}

#[derive(Debug, Clone)]
pub struct EmployeeDashboard {
    pub stats: EmployeeDashboardStats,
    pub active_timer: Option<ActiveTimer>,
    pub recent_time_entries: Vec<TimeEntryView>,
    pub recent_reports: Vec<DailyReport>,
    pub recent_access_requests: Vec<RequestView<AccessRequest>>,
}

#[derive(Clone)]
pub struct DashboardService {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn admin(&self, viewer: &Viewer) -> CoreResult<AdminDashboard> {
        viewer.require_admin()?;
        let today = self.clock.today();
        let mut tx = self.db.begin().await?;

        let total_employees = tx
            .list_users(&UserQuery {
                active: Some(true),
                role: Some(Role::Employee),
                search: None,
            })
            .await?
            .len();
        let active_projects = tx.list_projects(Some(ProjectStatus::Active)).await?.len();

        let pending = RequestQuery {
            status: Some(RequestStatus::Pending),
            ..Default::default()
        };
        let pending_access = tx.list_access_requests(&pending).await?;
        let pending_edits = tx.list_edit_requests(&pending).await?;
        let pending_requests = pending_access.len() + pending_edits.len();

        let reports_today = tx
            .list_reports(&ReportQuery {
                from: Some(today),
                to: Some(today),
                ..Default::default()
            })
            .await?
            .len();

        let latest: HashMap<Uuid, _> = tx
            .latest_locations(None)
            .await?
            .into_iter()
            .map(|record| (record.user_id, record))
            .collect();
        let active_users = tx
            .list_users(&UserQuery {
                active: Some(true),
                ..Default::default()
            })
            .await?;
        let mut seen: Vec<_> = active_users
            .into_iter()
            .map(|user| {
                let location = latest.get(&user.id);
                (user, location)
            })
            .collect();
        // Most recently seen first, never-seen last.
        seen.sort_by(|(_, a), (_, b)| b.map(|l| l.timestamp).cmp(&a.map(|l| l.timestamp)));
        seen.truncate(RECENT_ACTIVITY_LIMIT);

        let mut recent_activity = Vec::with_capacity(seen.len());
        for (user, location) in seen {
            let minutes = tx
                .sum_duration_minutes(&TimeEntryQuery {
                    user_id: Some(user.id),
                    from: Some(today),
                    to: Some(today),
                    ..Default::default()
                })
                .await?;
            recent_activity.push(EmployeeActivity {
                user_id: user.id,
                full_name: user.full_name,
                last_active: location.map(|l| l.timestamp),
                current_location: location.map(|l| (l.latitude, l.longitude)),
                hours_today: minutes_to_hours(minutes),
            });
        }

        let pending_access_requests = build_views(
            &AccessWorkflow,
            tx.as_mut(),
            pending_access.into_iter().take(PENDING_LIMIT).collect(),
        )
        .await?;
        let pending_edit_requests = build_views(
            &EditWorkflow,
            tx.as_mut(),
            pending_edits.into_iter().take(PENDING_LIMIT).collect(),
        )
        .await?;
        tx.commit().await?;

        Ok(AdminDashboard {
            stats: AdminStats {
                total_employees,
                active_projects,
                pending_requests,
                reports_today,
            },
            recent_activity,
            pending_access_requests,
            pending_edit_requests,
        })
    }

    pub async fn employee(&self, viewer: &Viewer) -> CoreResult<EmployeeDashboard> {
        let now = self.clock.now();
        let today = now.date_naive();
        let me = viewer.user_id;
        let mut tx = self.db.begin().await?;

        let today_minutes = tx
            .sum_duration_minutes(&TimeEntryQuery {
                user_id: Some(me),
                from: Some(today),
                to: Some(today),
                ..Default::default()
            })
            .await?;
        let week_minutes = tx
            .sum_duration_minutes(&TimeEntryQuery {
                user_id: Some(me),
                from: Some(start_of_week(today)),
                ..Default::default()
            })
            .await?;
        let active_projects = count_active_assignments(tx.as_mut(), me).await?;
        let reports_this_month = tx
            .list_reports(&ReportQuery {
                user_id: Some(me),
                from: Some(start_of_month(today)),
                ..Default::default()
            })
            .await?
            .len();

        let active_timer = load_active_timer(tx.as_mut(), me, now).await?;
        let completed = tx
            .list_time_entries(&TimeEntryQuery {
                user_id: Some(me),
                completed_only: true,
                limit: Some(5),
                ..Default::default()
            })
            .await?;
        let recent_time_entries = entry_views(tx.as_mut(), completed).await?;
        let recent_reports = tx
            .list_reports(&ReportQuery {
                user_id: Some(me),
                limit: Some(3),
                ..Default::default()
            })
            .await?;
        let requests = tx
            .list_access_requests(&RequestQuery {
                user_id: Some(me),
                limit: Some(5),
                ..Default::default()
            })
            .await?;
        let recent_access_requests = build_views(&AccessWorkflow, tx.as_mut(), requests).await?;
        tx.commit().await?;

        Ok(EmployeeDashboard {
            stats: EmployeeDashboardStats {
                hours_today: minutes_to_hours(today_minutes),
                hours_this_week: minutes_to_hours(week_minutes),
                active_projects,
                reports_this_month,
            },
            active_timer,
            recent_time_entries,
            recent_reports,
            recent_access_requests,
        })
    }
}
