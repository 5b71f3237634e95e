//! crates/timekeeper_core/src/edit_requests.rs
//!
//! Report edit requests. Approval opens a 24 hour window during which the
//! report owner may change the report once; see `reports::ReportService::apply_edit`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{ReportEditRequest, RequestStatus, Review};
use crate::error::{CoreError, CoreResult};
use crate::ports::{PortResult, RequestQuery, StoreTx};
use crate::validation::check_edit_reason;
use crate::viewer::Viewer;
use crate::workflow::{ApprovalEngine, Reviewable, Workflow};

pub type EditRequestEngine = ApprovalEngine<EditWorkflow>;

/// How long an approved edit request stays usable.
pub fn edit_window() -> Duration {
    Duration::hours(24)
}

#[derive(Debug, Clone)]
pub struct EditSubmission {
    pub report_id: Uuid,
    pub reason: String,
}

impl Reviewable for ReportEditRequest {
    fn id(&self) -> Uuid {
        self.id
    }

    fn requester(&self) -> Uuid {
        self.user_id
    }

    fn subject(&self) -> Uuid {
        self.report_id
    }

    fn review(&self) -> &Review {
        &self.review
    }

    fn review_mut(&mut self) -> &mut Review {
        &mut self.review
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditWorkflow;

#[async_trait]
impl Workflow for EditWorkflow {
    type Request = ReportEditRequest;
    type Submission = EditSubmission;

    const NAME: &'static str = "report edit request";

    async fn prepare(
        &self,
        tx: &mut dyn StoreTx,
        viewer: &Viewer,
        submission: EditSubmission,
        now: DateTime<Utc>,
    ) -> CoreResult<ReportEditRequest> {
        check_edit_reason(&submission.reason)?;

        let report = tx
            .get_report(submission.report_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Report not found"))?;
        if report.user_id != viewer.user_id {
            return Err(CoreError::forbidden("Not your report"));
        }

        let pending = tx
            .list_edit_requests(&RequestQuery {
                status: Some(RequestStatus::Pending),
                subject_id: Some(report.id),
                limit: Some(1),
                ..Default::default()
            })
            .await?;
        if !pending.is_empty() {
            return Err(CoreError::conflict(
                "Edit request already pending for this report",
            ));
        }

        Ok(ReportEditRequest {
            id: Uuid::new_v4(),
            report_id: report.id,
            user_id: viewer.user_id,
            reason: submission.reason,
            requested_at: now,
            review: Review::pending(),
            edit_deadline: None,
        })
    }

    async fn insert(&self, tx: &mut dyn StoreTx, request: &ReportEditRequest) -> PortResult<()> {
        tx.insert_edit_request(request).await
    }

    async fn lock(&self, tx: &mut dyn StoreTx, id: Uuid) -> PortResult<Option<ReportEditRequest>> {
        tx.lock_edit_request(id).await
    }

    async fn update(&self, tx: &mut dyn StoreTx, request: &ReportEditRequest) -> PortResult<()> {
        tx.update_edit_request(request).await
    }

    async fn list(
        &self,
        tx: &mut dyn StoreTx,
        query: &RequestQuery,
    ) -> PortResult<Vec<ReportEditRequest>> {
        tx.list_edit_requests(query).await
    }

    /// Labels each report with its date.
    async fn subject_labels(
        &self,
        tx: &mut dyn StoreTx,
        subject_ids: &[Uuid],
    ) -> PortResult<HashMap<Uuid, String>> {
        let mut labels = HashMap::with_capacity(subject_ids.len());
        for id in subject_ids {
            if let Some(report) = tx.get_report(*id).await? {
                labels.insert(*id, report.report_date.to_string());
            }
        }
        Ok(labels)
    }

    fn stamp_approval(&self, request: &mut ReportEditRequest, now: DateTime<Utc>) {
        request.edit_deadline = Some(now + edit_window());
    }
}
