//! crates/timekeeper_core/src/workflow.rs
//!
//! The approval state machine shared by project access requests and report edit
//! requests: `pending` is the only initial state, `approved` and `rejected` are
//! terminal. A [`Workflow`] supplies the subject-specific parts (submission
//! preconditions, persistence, and the side effect of approval); the
//! [`ApprovalEngine`] owns the transitions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{RequestStatus, Review};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, DatabaseService, PortResult, RequestQuery, StoreTx};
use crate::validation::check_rejection_reason;
use crate::viewer::Viewer;

//=========================================================================================
// Traits
//=========================================================================================

/// A request record carrying a [`Review`].
pub trait Reviewable: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    /// The user who asked.
    fn requester(&self) -> Uuid;
    /// The thing being asked about (project or report).
    fn subject(&self) -> Uuid;
    fn review(&self) -> &Review;
    fn review_mut(&mut self) -> &mut Review;
}

/// The subject-specific half of an approval flow.
#[async_trait]
pub trait Workflow: Send + Sync + 'static {
    type Request: Reviewable;
    type Submission: Send + 'static;

    /// Human readable name used in logs.
    const NAME: &'static str;

    /// Checks the submission preconditions and builds the new pending request.
    async fn prepare(
        &self,
        tx: &mut dyn StoreTx,
        viewer: &Viewer,
        submission: Self::Submission,
        now: DateTime<Utc>,
    ) -> CoreResult<Self::Request>;

    async fn insert(&self, tx: &mut dyn StoreTx, request: &Self::Request) -> PortResult<()>;

    async fn lock(&self, tx: &mut dyn StoreTx, id: Uuid) -> PortResult<Option<Self::Request>>;

    async fn update(&self, tx: &mut dyn StoreTx, request: &Self::Request) -> PortResult<()>;

    async fn list(
        &self,
        tx: &mut dyn StoreTx,
        query: &RequestQuery,
    ) -> PortResult<Vec<Self::Request>>;

    /// Display labels for the given subjects, keyed by subject id.
    async fn subject_labels(
        &self,
        tx: &mut dyn StoreTx,
        subject_ids: &[Uuid],
    ) -> PortResult<HashMap<Uuid, String>>;

    /// Adjusts the request's own fields when it is approved.
    fn stamp_approval(&self, _request: &mut Self::Request, _now: DateTime<Utc>) {}

    /// Writes made elsewhere in the store as part of the approval. Runs in the
    /// same transaction as the status write.
    async fn on_approve(
        &self,
        _tx: &mut dyn StoreTx,
        _request: &Self::Request,
        _now: DateTime<Utc>,
    ) -> CoreResult<()> {
        Ok(())
    }
}

//=========================================================================================
// Views
//=========================================================================================

/// A request together with the names a client needs to display it.
#[derive(Debug, Clone)]
pub struct RequestView<R> {
    pub request: R,
    pub requester_name: Option<String>,
    pub reviewer_name: Option<String>,
    pub subject_label: Option<String>,
}

/// Listing options. The requester restriction comes from the viewer, never from here.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub subject_id: Option<Uuid>,
    pub limit: Option<usize>,
}

pub(crate) async fn build_views<W: Workflow>(
    workflow: &W,
    tx: &mut dyn StoreTx,
    requests: Vec<W::Request>,
) -> PortResult<Vec<RequestView<W::Request>>> {
    let mut people: Vec<Uuid> = requests.iter().map(|r| r.requester()).collect();
    people.extend(requests.iter().filter_map(|r| r.review().reviewed_by));
    people.sort();
    people.dedup();
    let mut subjects: Vec<Uuid> = requests.iter().map(|r| r.subject()).collect();
    subjects.sort();
    subjects.dedup();

    let names = tx.user_names(&people).await?;
    let labels = workflow.subject_labels(tx, &subjects).await?;

    Ok(requests
        .into_iter()
        .map(|request| RequestView {
            requester_name: names.get(&request.requester()).cloned(),
            reviewer_name: request
                .review()
                .reviewed_by
                .and_then(|id| names.get(&id).cloned()),
            subject_label: labels.get(&request.subject()).cloned(),
            request,
        })
        .collect())
}

//=========================================================================================
// The Engine
//=========================================================================================

pub struct ApprovalEngine<W: Workflow> {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
    workflow: W,
}

impl<W: Workflow + Clone> Clone for ApprovalEngine<W> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            clock: self.clock.clone(),
            workflow: self.workflow.clone(),
        }
    }
}

impl<W: Workflow> ApprovalEngine<W> {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>, workflow: W) -> Self {
        Self {
            db,
            clock,
            workflow,
        }
    }

    /// Creates a new pending request on behalf of the viewer.
    pub async fn submit(
        &self,
        viewer: &Viewer,
        submission: W::Submission,
    ) -> CoreResult<W::Request> {
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let request = self
            .workflow
            .prepare(tx.as_mut(), viewer, submission, now)
            .await?;
        self.workflow.insert(tx.as_mut(), &request).await?;
        tx.commit().await?;

        info!(
            request_id = %request.id(),
            requester = %viewer.user_id,
            "{} submitted",
            W::NAME
        );
        Ok(request)
    }

    /// Moves a pending request to `approved` and applies the workflow's side effect.
    /// Nothing is written unless every step succeeds.
    pub async fn approve(&self, viewer: &Viewer, id: Uuid) -> CoreResult<W::Request> {
        viewer.require_admin()?;
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let mut request = self.lock_pending(tx.as_mut(), id).await?;

        {
            let review = request.review_mut();
            review.status = RequestStatus::Approved;
            review.reviewed_by = Some(viewer.user_id);
            review.reviewed_at = Some(now);
        }
        self.workflow.stamp_approval(&mut request, now);
        self.workflow.update(tx.as_mut(), &request).await?;
        self.workflow.on_approve(tx.as_mut(), &request, now).await?;
        tx.commit().await?;

        info!(request_id = %id, reviewer = %viewer.user_id, "{} approved", W::NAME);
        Ok(request)
    }

    /// Moves a pending request to `rejected`.
    pub async fn reject(
        &self,
        viewer: &Viewer,
        id: Uuid,
        reason: Option<String>,
    ) -> CoreResult<W::Request> {
        viewer.require_admin()?;
        check_rejection_reason(reason.as_deref())?;
        let now = self.clock.now();
        let mut tx = self.db.begin().await?;
        let mut request = self.lock_pending(tx.as_mut(), id).await?;

        {
            let review = request.review_mut();
            review.status = RequestStatus::Rejected;
            review.reviewed_by = Some(viewer.user_id);
            review.reviewed_at = Some(now);
            review.rejection_reason = reason;
        }
        self.workflow.update(tx.as_mut(), &request).await?;
        tx.commit().await?;

        info!(request_id = %id, reviewer = %viewer.user_id, "{} rejected", W::NAME);
        Ok(request)
    }

    /// Requests visible to the viewer: everything for admins, their own for employees.
    pub async fn list(
        &self,
        viewer: &Viewer,
        filter: RequestFilter,
    ) -> CoreResult<Vec<RequestView<W::Request>>> {
        let query = RequestQuery {
            status: filter.status,
            user_id: viewer.scope(None),
            subject_id: filter.subject_id,
            limit: filter.limit,
        };
        let mut tx = self.db.begin().await?;
        let requests = self.workflow.list(tx.as_mut(), &query).await?;
        let views = build_views(&self.workflow, tx.as_mut(), requests).await?;
        tx.commit().await?;
        Ok(views)
    }

    async fn lock_pending(&self, tx: &mut dyn StoreTx, id: Uuid) -> CoreResult<W::Request> {
        let request = self
            .workflow
            .lock(tx, id)
            .await?
            .ok_or_else(|| CoreError::not_found("Request not found"))?;
        if !request.review().is_pending() {
            return Err(CoreError::conflict("Request already reviewed"));
        }
        Ok(request)
    }
}
