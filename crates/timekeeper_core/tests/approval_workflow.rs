mod common;

use chrono::Utc;
use common::Harness;
use timekeeper_core::projects::ProjectChanges;
use timekeeper_core::{
    AccessSubmission, CoreError, DatabaseService, ProjectAssignment, RequestFilter,
    RequestStatus,
};
use uuid::Uuid;

#[tokio::test]
async fn approval_assigns_the_requester() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;

    let request = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: project.id })
        .await
        .unwrap();
    assert_eq!(request.review.status, RequestStatus::Pending);

    let approved = h
        .services
        .access_requests
        .approve(&h.admin, request.id)
        .await
        .unwrap();
    assert_eq!(approved.review.status, RequestStatus::Approved);
    assert_eq!(approved.review.reviewed_by, Some(h.admin.user_id));
    assert!(approved.review.reviewed_at.is_some());

    let mut tx = h.store.begin().await.unwrap();
    assert!(tx.get_assignment(project.id, alice.user_id).await.unwrap().is_some());
}

#[tokio::test]
async fn a_reviewed_request_cannot_be_reviewed_again() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    let request = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: project.id })
        .await
        .unwrap();

    h.services
        .access_requests
        .reject(&h.admin, request.id, Some("Not this quarter".to_string()))
        .await
        .unwrap();

    let approve = h.services.access_requests.approve(&h.admin, request.id).await;
    assert!(matches!(approve, Err(CoreError::Conflict(_))));
    let reject = h.services.access_requests.reject(&h.admin, request.id, None).await;
    assert!(matches!(reject, Err(CoreError::Conflict(_))));

    let mut tx = h.store.begin().await.unwrap();
    assert!(tx.get_assignment(project.id, alice.user_id).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_reviews_have_exactly_one_winner() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    let request = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: project.id })
        .await
        .unwrap();

    let (approve, reject) = tokio::join!(
        h.services.access_requests.approve(&h.admin, request.id),
        h.services.access_requests.reject(&h.admin, request.id, None),
    );
    assert!(approve.is_ok() ^ reject.is_ok());
    let loser = if approve.is_ok() { reject.unwrap_err() } else { approve.unwrap_err() };
    assert!(matches!(loser, CoreError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_pending_request_is_a_conflict() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    let submission = AccessSubmission { project_id: project.id };

    h.services
        .access_requests
        .submit(&alice, submission.clone())
        .await
        .unwrap();
    let second = h.services.access_requests.submit(&alice, submission).await;
    assert!(matches!(second, Err(CoreError::Conflict(_))));
}

#[tokio::test]
async fn submitting_when_already_assigned_is_a_conflict() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    h.assign(&alice, project.id).await;

    let again = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: project.id })
        .await;
    assert!(matches!(again, Err(CoreError::Conflict(_))));
}

#[tokio::test]
async fn missing_or_inactive_projects_are_refused() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;

    let missing = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: Uuid::new_v4() })
        .await;
    assert!(matches!(missing, Err(CoreError::NotFound(_))));

    let project = h.project("Dormant").await;
    h.services
        .projects
        .update(
            &h.admin,
            project.id,
            ProjectChanges {
                status: Some("inactive".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let inactive = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: project.id })
        .await;
    assert!(matches!(inactive, Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn approving_keeps_an_existing_assignment() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    let request = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: project.id })
        .await
        .unwrap();

    // Assignment created out of band while the request was pending.
    let existing = ProjectAssignment {
        id: Uuid::new_v4(),
        project_id: project.id,
        user_id: alice.user_id,
        assigned_at: Utc::now(),
    };
    {
        let mut tx = h.store.begin().await.unwrap();
        assert!(tx.insert_assignment(&existing).await.unwrap());
        tx.commit().await.unwrap();
    }

    h.services
        .access_requests
        .approve(&h.admin, request.id)
        .await
        .unwrap();

    let mut tx = h.store.begin().await.unwrap();
    let assignments = tx
        .list_assignments(Some(project.id), Some(alice.user_id))
        .await
        .unwrap();
    assert_eq!(assignments, vec![existing]);
}

#[tokio::test]
async fn failed_side_effect_rolls_back_the_approval() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    let request = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: project.id })
        .await
        .unwrap();

    h.store.inject_failure("insert_assignment");
    let failed = h.services.access_requests.approve(&h.admin, request.id).await;
    assert!(matches!(failed, Err(CoreError::Internal(_))));
    h.store.clear_failures();

    let pending = h
        .services
        .access_requests
        .list(
            &h.admin,
            RequestFilter {
                status: Some(RequestStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].request.id, request.id);

    // The request is still reviewable once the store recovers.
    h.services
        .access_requests
        .approve(&h.admin, request.id)
        .await
        .unwrap();
}

#[tokio::test]
async fn rejection_reason_length_is_bounded() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    let request = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: project.id })
        .await
        .unwrap();

    let too_long = h
        .services
        .access_requests
        .reject(&h.admin, request.id, Some("x".repeat(501)))
        .await;
    assert!(matches!(too_long, Err(CoreError::Validation(_))));

    let rejected = h
        .services
        .access_requests
        .reject(&h.admin, request.id, Some("x".repeat(500)))
        .await
        .unwrap();
    assert_eq!(rejected.review.status, RequestStatus::Rejected);
    assert_eq!(rejected.review.rejection_reason.map(|r| r.len()), Some(500));
}

#[tokio::test]
async fn only_admins_review() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    let request = h
        .services
        .access_requests
        .submit(&alice, AccessSubmission { project_id: project.id })
        .await
        .unwrap();

    let approve = h.services.access_requests.approve(&alice, request.id).await;
    assert!(matches!(approve, Err(CoreError::Forbidden(_))));
    let reject = h.services.access_requests.reject(&alice, request.id, None).await;
    assert!(matches!(reject, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn unknown_request_is_not_found() {
    let h = Harness::start().await;
    let result = h
        .services
        .access_requests
        .approve(&h.admin, Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn employees_only_list_their_own_requests() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let bob = h.employee("Bob Jones").await;
    let project = h.project("Apollo").await;
    for viewer in [&alice, &bob] {
        h.services
            .access_requests
            .submit(viewer, AccessSubmission { project_id: project.id })
            .await
            .unwrap();
    }

    let mine = h
        .services
        .access_requests
        .list(&alice, RequestFilter::default())
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].request.user_id, alice.user_id);
    assert_eq!(mine[0].requester_name.as_deref(), Some("Alice Smith"));
    assert_eq!(mine[0].subject_label.as_deref(), Some("Apollo"));

    let all = h
        .services
        .access_requests
        .list(&h.admin, RequestFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}
