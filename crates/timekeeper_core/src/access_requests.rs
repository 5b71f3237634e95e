//! crates/timekeeper_core/src/access_requests.rs
//!
//! Project access requests: an employee asks to join a project, an admin approves
//! (which assigns them) or rejects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{AccessRequest, ProjectAssignment, ProjectStatus, RequestStatus, Review};
use crate::error::{CoreError, CoreResult};
use crate::ports::{PortResult, RequestQuery, StoreTx};
use crate::viewer::Viewer;
use crate::workflow::{ApprovalEngine, Reviewable, Workflow};

pub type AccessRequestEngine = ApprovalEngine<AccessWorkflow>;

#[derive(Debug, Clone)]
pub struct AccessSubmission {
    pub project_id: Uuid,
}

impl Reviewable for AccessRequest {
    fn id(&self) -> Uuid {
        self.id
    }

    fn requester(&self) -> Uuid {
        self.user_id
    }

    fn subject(&self) -> Uuid {
        self.project_id
    }

    fn review(&self) -> &Review {
        &self.review
    }

    fn review_mut(&mut self) -> &mut Review {
        &mut self.review
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessWorkflow;

#[async_trait]
impl Workflow for AccessWorkflow {
    type Request = AccessRequest;
    type Submission = AccessSubmission;

    const NAME: &'static str = "project access request";

    async fn prepare(
        &self,
        tx: &mut dyn StoreTx,
        viewer: &Viewer,
        submission: AccessSubmission,
        now: DateTime<Utc>,
    ) -> CoreResult<AccessRequest> {
        let project = tx
            .get_project(submission.project_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Project not found"))?;
        if project.status != ProjectStatus::Active {
            return Err(CoreError::validation(
                "Cannot request access to inactive project",
            ));
        }

        if tx.get_assignment(project.id, viewer.user_id).await?.is_some() {
            return Err(CoreError::conflict(
                "You already have access to this project",
            ));
        }

        let pending = tx
            .list_access_requests(&RequestQuery {
                status: Some(RequestStatus::Pending),
                user_id: Some(viewer.user_id),
                subject_id: Some(project.id),
                limit: Some(1),
            })
            .await?;
        if !pending.is_empty() {
            return Err(CoreError::conflict(
                "Access request already pending for this project",
            ));
        }

        Ok(AccessRequest {
            id: Uuid::new_v4(),
            project_id: project.id,
            user_id: viewer.user_id,
            requested_at: now,
            review: Review::pending(),
        })
    }

    async fn insert(&self, tx: &mut dyn StoreTx, request: &AccessRequest) -> PortResult<()> {
        tx.insert_access_request(request).await
    }

    async fn lock(&self, tx: &mut dyn StoreTx, id: Uuid) -> PortResult<Option<AccessRequest>> {
        tx.lock_access_request(id).await
    }

    async fn update(&self, tx: &mut dyn StoreTx, request: &AccessRequest) -> PortResult<()> {
        tx.update_access_request(request).await
    }

    async fn list(
        &self,
        tx: &mut dyn StoreTx,
        query: &RequestQuery,
    ) -> PortResult<Vec<AccessRequest>> {
        tx.list_access_requests(query).await
    }

    async fn subject_labels(
        &self,
        tx: &mut dyn StoreTx,
        subject_ids: &[Uuid],
    ) -> PortResult<HashMap<Uuid, String>> {
        tx.project_names(subject_ids).await
    }

    async fn on_approve(
        &self,
        tx: &mut dyn StoreTx,
        request: &AccessRequest,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        let inserted = tx
            .insert_assignment(&ProjectAssignment {
                id: Uuid::new_v4(),
                project_id: request.project_id,
                user_id: request.user_id,
                assigned_at: now,
            })
            .await?;
        if !inserted {
            debug!(
                project_id = %request.project_id,
                user_id = %request.user_id,
                "user was already assigned; keeping existing assignment"
            );
        }
        Ok(())
    }
}
