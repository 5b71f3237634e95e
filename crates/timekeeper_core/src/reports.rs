//! crates/timekeeper_core/src/reports.rs
//!
//! Daily reports and the edit gate. A report is immutable once submitted except
//! through an approved, unexpired edit request, and each such grant is consumed
//! by the edit it authorizes.

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::clock::days_before;
use crate::domain::{DailyReport, ReportEditRequest, RequestStatus};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, DatabaseService, PortResult, ReportQuery, RequestQuery, StoreTx};
use crate::validation::{check_report_fields, is_future_date};
use crate::viewer::Viewer;

#[derive(Debug, Clone)]
pub struct NewReport {
    /// Defaults to today.
    pub report_date: Option<NaiveDate>,
    pub tasks_completed: Vec<String>,
    pub hours_worked: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportEdit {
    pub tasks_completed: Vec<String>,
    pub hours_worked: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub user_id: Option<Uuid>,
    /// Defaults to seven days before today.
    pub start_date: Option<NaiveDate>,
    /// Defaults to today.
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct ReportView {
    pub report: DailyReport,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReportDetail {
    pub report: DailyReport,
    pub user_name: Option<String>,
    /// Whether the viewer holds a usable edit grant for this report.
    pub can_edit: bool,
}

/// The grant that currently authorizes an edit of `report`, if any. When several
/// approved requests are live, the one with the latest deadline wins.
pub(crate) async fn active_grant(
    tx: &mut dyn StoreTx,
    report: &DailyReport,
    now: DateTime<Utc>,
) -> PortResult<Option<ReportEditRequest>> {
    let approved = tx
        .list_edit_requests(&RequestQuery {
            status: Some(RequestStatus::Approved),
            user_id: Some(report.user_id),
            subject_id: Some(report.id),
            limit: None,
        })
        .await?;
    Ok(approved
        .into_iter()
        .filter(|request| request.is_active_grant(now))
        .max_by_key(|request| request.edit_deadline))
}

#[derive(Clone)]
pub struct ReportService {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
}

impl ReportService {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn submit(&self, viewer: &Viewer, input: NewReport) -> CoreResult<DailyReport> {
        let now = self.clock.now();
        let today = now.date_naive();
        let report_date = input.report_date.unwrap_or(today);
        if is_future_date(report_date, today) {
            return Err(CoreError::validation(
                "Cannot submit report for future dates",
            ));
        }
        check_report_fields(
            &input.tasks_completed,
            input.hours_worked,
            input.notes.as_deref(),
        )?;

        let mut tx = self.db.begin().await?;
        let existing = tx
            .list_reports(&ReportQuery {
                user_id: Some(viewer.user_id),
                from: Some(report_date),
                to: Some(report_date),
                limit: Some(1),
            })
            .await?;
        if !existing.is_empty() {
            return Err(CoreError::conflict("Report already exists for this date"));
        }

        let report = DailyReport {
            id: Uuid::new_v4(),
            user_id: viewer.user_id,
            report_date,
            tasks_completed: input.tasks_completed,
            hours_worked: input.hours_worked,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        tx.insert_report(&report).await?;
        tx.commit().await?;

        info!(report_id = %report.id, user_id = %viewer.user_id, date = %report_date, "report submitted");
        Ok(report)
    }

    pub async fn list(&self, viewer: &Viewer, filter: ReportFilter) -> CoreResult<Vec<ReportView>> {
        let today = self.clock.today();
        let query = ReportQuery {
            user_id: viewer.scope(filter.user_id),
            from: Some(filter.start_date.unwrap_or_else(|| days_before(today, 7))),
            to: Some(filter.end_date.unwrap_or(today)),
            limit: None,
        };

        let mut tx = self.db.begin().await?;
        let reports = tx.list_reports(&query).await?;
        let mut ids: Vec<Uuid> = reports.iter().map(|r| r.user_id).collect();
        ids.sort();
        ids.dedup();
        let names = tx.user_names(&ids).await?;
        tx.commit().await?;

        Ok(reports
            .into_iter()
            .map(|report| ReportView {
                user_name: names.get(&report.user_id).cloned(),
                report,
            })
            .collect())
    }

    pub async fn get(&self, viewer: &Viewer, id: Uuid) -> CoreResult<ReportDetail> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let report = tx
            .get_report(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Report not found"))?;
        if !viewer.can_see(report.user_id) {
            return Err(CoreError::forbidden("Access denied"));
        }
        let can_edit =
            report.user_id == viewer.user_id && active_grant(tx.as_mut(), &report, now).await?.is_some();
        let user_name = tx.user_names(&[report.user_id]).await?.remove(&report.user_id);
        tx.commit().await?;

        Ok(ReportDetail {
            report,
            user_name,
            can_edit,
        })
    }

    /// True iff the viewer owns the report and holds an approved grant whose
    /// deadline is still ahead.
    pub async fn can_edit(&self, viewer: &Viewer, report_id: Uuid) -> CoreResult<bool> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let report = tx
            .get_report(report_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Report not found"))?;
        if report.user_id != viewer.user_id {
            return Ok(false);
        }
        let grant = active_grant(tx.as_mut(), &report, now).await?;
        tx.commit().await?;
        Ok(grant.is_some())
    }

    /// Overwrites the report's fields and consumes the grant that allowed it.
    pub async fn apply_edit(
        &self,
        viewer: &Viewer,
        report_id: Uuid,
        edit: ReportEdit,
    ) -> CoreResult<DailyReport> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let mut report = tx
            .get_report(report_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Report not found"))?;
        if report.user_id != viewer.user_id {
            return Err(CoreError::forbidden("Not your report"));
        }

        let no_permission = || CoreError::forbidden("No active edit permission");
        let grant = active_grant(tx.as_mut(), &report, now)
            .await?
            .ok_or_else(no_permission)?;
        // Re-read under lock so two concurrent edits cannot share one grant.
        let grant = tx
            .lock_edit_request(grant.id)
            .await?
            .filter(|g| g.is_active_grant(now))
            .ok_or_else(no_permission)?;

        check_report_fields(&edit.tasks_completed, edit.hours_worked, edit.notes.as_deref())?;

        report.tasks_completed = edit.tasks_completed;
        report.hours_worked = edit.hours_worked;
        report.notes = edit.notes;
        report.updated_at = now;
        tx.update_report(&report).await?;
        tx.delete_edit_request(grant.id).await?;
        tx.commit().await?;

        info!(report_id = %report.id, grant_id = %grant.id, "report edited");
        Ok(report)
    }
}
