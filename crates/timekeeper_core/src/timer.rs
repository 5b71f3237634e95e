//! crates/timekeeper_core/src/timer.rs
//!
//! Time entries: the start/stop timer, manual entries, and the listing with totals.
//! A user has at most one open timer at any moment, across all projects.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::clock::{days_before, minutes_to_hours, whole_minutes_between, whole_seconds_between};
use crate::domain::{EntryType, TimeEntry};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, DatabaseService, PortResult, StoreTx, TimeEntryQuery};
use crate::validation::{check_task_description, is_future_date};
use crate::viewer::Viewer;

/// Upper bound for a single entry: one full day.
pub const MAX_ENTRY_MINUTES: i64 = 1440;

#[derive(Debug, Clone)]
pub struct ManualEntry {
    pub project_id: Uuid,
    pub task_description: String,
    pub entry_date: NaiveDate,
    pub hours: f64,
    pub minutes: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TimeEntryFilter {
    pub user_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    /// Defaults to seven days before today.
    pub start_date: Option<NaiveDate>,
    /// Defaults to today.
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct TimeEntryView {
    pub entry: TimeEntry,
    pub project_name: Option<String>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActiveTimer {
    pub timer: TimeEntryView,
    /// Derived on read, never stored.
    pub elapsed_seconds: i64,
}

#[derive(Debug, Clone)]
pub struct TimeEntryListing {
    pub entries: Vec<TimeEntryView>,
    pub total_hours: f64,
    pub total_entries: usize,
}

pub(crate) async fn entry_views(
    tx: &mut dyn StoreTx,
    entries: Vec<TimeEntry>,
) -> PortResult<Vec<TimeEntryView>> {
    let mut projects: Vec<Uuid> = entries.iter().map(|e| e.project_id).collect();
    projects.sort();
    projects.dedup();
    let mut users: Vec<Uuid> = entries.iter().map(|e| e.user_id).collect();
    users.sort();
    users.dedup();

    let project_names = tx.project_names(&projects).await?;
    let user_names = tx.user_names(&users).await?;
    Ok(entries
        .into_iter()
        .map(|entry| TimeEntryView {
            project_name: project_names.get(&entry.project_id).cloned(),
            user_name: user_names.get(&entry.user_id).cloned(),
            entry,
        })
        .collect())
}

pub(crate) async fn load_active_timer(
    tx: &mut dyn StoreTx,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> PortResult<Option<ActiveTimer>> {
    let Some(entry) = tx.find_open_timer(user_id).await? else {
        return Ok(None);
    };
    let elapsed_seconds = entry
        .start_time
        .map(|start| whole_seconds_between(start, now))
        .unwrap_or_default();
    let timer = entry_views(tx, vec![entry]).await?.remove(0);
    Ok(Some(ActiveTimer {
        timer,
        elapsed_seconds,
    }))
}

async fn require_assignment(tx: &mut dyn StoreTx, project_id: Uuid, user_id: Uuid) -> CoreResult<()> {
    if tx.get_assignment(project_id, user_id).await?.is_none() {
        return Err(CoreError::forbidden(
            "You do not have access to this project",
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct TimerService {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
}

impl TimerService {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Opens a timer on a project the viewer is assigned to.
    pub async fn start(
        &self,
        viewer: &Viewer,
        project_id: Uuid,
        task_description: String,
    ) -> CoreResult<TimeEntryView> {
        check_task_description(&task_description)?;
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        require_assignment(tx.as_mut(), project_id, viewer.user_id).await?;

        if tx.find_open_timer(viewer.user_id).await?.is_some() {
            return Err(CoreError::conflict(
                "Timer already running. Please stop current timer first.",
            ));
        }

        let entry = TimeEntry {
            id: Uuid::new_v4(),
            user_id: viewer.user_id,
            project_id,
            task_description,
            entry_type: EntryType::Timer,
            entry_date: now.date_naive(),
            start_time: Some(now),
            end_time: None,
            duration_minutes: 0,
            created_at: now,
            updated_at: now,
        };
        tx.insert_time_entry(&entry).await?;
        let view = entry_views(tx.as_mut(), vec![entry]).await?.remove(0);
        tx.commit().await?;

        info!(entry_id = %view.entry.id, user_id = %viewer.user_id, project_id = %project_id, "timer started");
        Ok(view)
    }

    /// Closes the viewer's timer, recording whole elapsed minutes.
    pub async fn stop(&self, viewer: &Viewer, entry_id: Uuid) -> CoreResult<TimeEntryView> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let mut entry = tx
            .lock_time_entry(entry_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Time entry not found"))?;
        if entry.user_id != viewer.user_id {
            return Err(CoreError::forbidden("Not your time entry"));
        }
        if entry.entry_type != EntryType::Timer {
            return Err(CoreError::validation("Not a timer entry"));
        }
        if entry.end_time.is_some() {
            return Err(CoreError::validation("Timer already stopped"));
        }
        let start = entry
            .start_time
            .ok_or_else(|| CoreError::validation("Timer has no start time"))?;

        entry.duration_minutes = whole_minutes_between(start, now);
        entry.end_time = Some(now);
        entry.updated_at = now;
        tx.update_time_entry(&entry).await?;
        let view = entry_views(tx.as_mut(), vec![entry]).await?.remove(0);
        tx.commit().await?;

        info!(
            entry_id = %entry_id,
            duration_minutes = view.entry.duration_minutes,
            "timer stopped"
        );
        Ok(view)
    }

    /// Records time worked without a timer.
    pub async fn add_manual(&self, viewer: &Viewer, input: ManualEntry) -> CoreResult<TimeEntryView> {
        check_task_description(&input.task_description)?;
        let now = self.clock.now();
        if is_future_date(input.entry_date, now.date_naive()) {
            return Err(CoreError::validation("Cannot log time for future dates"));
        }
        let total_minutes = manual_duration_minutes(input.hours, input.minutes)?;

        let mut tx = self.db.begin().await?;
        require_assignment(tx.as_mut(), input.project_id, viewer.user_id).await?;

        let entry = TimeEntry {
            id: Uuid::new_v4(),
            user_id: viewer.user_id,
            project_id: input.project_id,
            task_description: input.task_description,
            entry_type: EntryType::Manual,
            entry_date: input.entry_date,
            start_time: None,
            end_time: None,
            duration_minutes: total_minutes,
            created_at: now,
            updated_at: now,
        };
        tx.insert_time_entry(&entry).await?;
        let view = entry_views(tx.as_mut(), vec![entry]).await?.remove(0);
        tx.commit().await?;

        info!(entry_id = %view.entry.id, minutes = total_minutes, "manual entry added");
        Ok(view)
    }

    /// The viewer's open timer, if any.
    pub async fn active(&self, viewer: &Viewer) -> CoreResult<Option<ActiveTimer>> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let active = load_active_timer(tx.as_mut(), viewer.user_id, now).await?;
        tx.commit().await?;
        Ok(active)
    }

    pub async fn list(&self, viewer: &Viewer, filter: TimeEntryFilter) -> CoreResult<TimeEntryListing> {
        let today = self.clock.today();
        let query = TimeEntryQuery {
            user_id: viewer.scope(filter.user_id),
            project_id: filter.project_id,
            from: Some(filter.start_date.unwrap_or_else(|| days_before(today, 7))),
            to: Some(filter.end_date.unwrap_or(today)),
            completed_only: false,
            limit: None,
        };

        let mut tx = self.db.begin().await?;
        let entries = tx.list_time_entries(&query).await?;
        let total_minutes: i64 = entries.iter().map(|e| e.duration_minutes).sum();
        let entries = entry_views(tx.as_mut(), entries).await?;
        tx.commit().await?;

        Ok(TimeEntryListing {
            total_hours: minutes_to_hours(total_minutes),
            total_entries: entries.len(),
            entries,
        })
    }
}

/// `floor(hours * 60 + minutes)`, after range checks on both parts and the total.
pub fn manual_duration_minutes(hours: f64, minutes: f64) -> CoreResult<i64> {
    if !(0.0..=24.0).contains(&hours) || !(0.0..=59.0).contains(&minutes) {
        return Err(CoreError::validation("Invalid duration values"));
    }
    let total = (hours * 60.0 + minutes).floor() as i64;
    if total < 1 {
        return Err(CoreError::validation("Duration must be at least 1 minute"));
    }
    if total > MAX_ENTRY_MINUTES {
        return Err(CoreError::validation(
            "Duration cannot exceed 24 hours (1440 minutes)",
        ));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_duration_bounds() {
        assert_eq!(manual_duration_minutes(24.0, 0.0).unwrap(), 1440);
        assert_eq!(manual_duration_minutes(1.5, 10.0).unwrap(), 100);
        assert_eq!(manual_duration_minutes(0.0, 1.0).unwrap(), 1);
        assert!(manual_duration_minutes(25.0, 0.0).is_err());
        assert!(manual_duration_minutes(24.0, 1.0).is_err());
        assert!(manual_duration_minutes(0.0, 0.5).is_err());
        assert!(manual_duration_minutes(0.0, 60.0).is_err());
        assert!(manual_duration_minutes(-1.0, 30.0).is_err());
    }
}
