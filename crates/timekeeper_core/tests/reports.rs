mod common;

use chrono::Duration;
use common::Harness;
use timekeeper_core::reports::{NewReport, ReportEdit, ReportFilter};
use timekeeper_core::{
    CoreError, DailyReport, EditSubmission, ReportEditRequest, RequestFilter, RequestStatus, Viewer,
};

fn tasks(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

async fn submit(h: &Harness, viewer: &Viewer) -> DailyReport {
    h.services
        .reports
        .submit(
            viewer,
            NewReport {
                report_date: None,
                tasks_completed: tasks(&["A", "B"]),
                hours_worked: 7.5,
                notes: None,
            },
        )
        .await
        .unwrap()
}

fn edit() -> ReportEdit {
    ReportEdit {
        tasks_completed: tasks(&["A", "B", "C"]),
        hours_worked: 8.0,
        notes: Some("Stayed late".to_string()),
    }
}

async fn grant(h: &Harness, viewer: &Viewer, report: &DailyReport) -> ReportEditRequest {
    let request = h
        .services
        .edit_requests
        .submit(
            viewer,
            EditSubmission {
                report_id: report.id,
                reason: "Forgot a task".to_string(),
            },
        )
        .await
        .unwrap();
    h.services
        .edit_requests
        .approve(&h.admin, request.id)
        .await
        .unwrap()
}

#[tokio::test]
async fn submitted_report_reads_back_unchanged() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let report = submit(&h, &alice).await;

    let detail = h.services.reports.get(&alice, report.id).await.unwrap();
    assert_eq!(detail.report.tasks_completed, tasks(&["A", "B"]));
    assert_eq!(detail.report.hours_worked, 7.5);
    assert_eq!(detail.report.report_date, h.clock_today());
    assert_eq!(detail.user_name.as_deref(), Some("Alice Smith"));
    assert!(!detail.can_edit);
}

#[tokio::test]
async fn one_report_per_day() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    submit(&h, &alice).await;

    let again = h
        .services
        .reports
        .submit(
            &alice,
            NewReport {
                report_date: None,
                tasks_completed: tasks(&["C"]),
                hours_worked: 1.0,
                notes: None,
            },
        )
        .await;
    assert!(matches!(again, Err(CoreError::Conflict(_))));
}

#[tokio::test]
async fn report_field_rules() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let today = h.clock_today();

    let cases = [
        (Some(today + Duration::days(1)), tasks(&["A"]), 1.0),
        (None, Vec::new(), 1.0),
        (None, tasks(&["  "]), 1.0),
        (None, vec!["x".repeat(501)], 1.0),
        (None, tasks(&["A"]), 0.05),
        (None, tasks(&["A"]), 24.5),
    ];
    for (report_date, tasks_completed, hours_worked) in cases {
        let result = h
            .services
            .reports
            .submit(
                &alice,
                NewReport {
                    report_date,
                    tasks_completed,
                    hours_worked,
                    notes: None,
                },
            )
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }
}

#[tokio::test]
async fn edits_require_an_approved_grant() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let report = submit(&h, &alice).await;

    let denied = h.services.reports.apply_edit(&alice, report.id, edit()).await;
    assert!(matches!(denied, Err(CoreError::Forbidden(_))));

    grant(&h, &alice, &report).await;
    assert!(h.services.reports.can_edit(&alice, report.id).await.unwrap());

    let edited = h
        .services
        .reports
        .apply_edit(&alice, report.id, edit())
        .await
        .unwrap();
    assert_eq!(edited.tasks_completed, tasks(&["A", "B", "C"]));
    assert_eq!(edited.hours_worked, 8.0);
    assert_eq!(edited.notes.as_deref(), Some("Stayed late"));

    // The grant is spent.
    assert!(!h.services.reports.can_edit(&alice, report.id).await.unwrap());
    let second = h.services.reports.apply_edit(&alice, report.id, edit()).await;
    assert!(matches!(second, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn grants_expire_after_the_window() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let report = submit(&h, &alice).await;
    grant(&h, &alice, &report).await;

    h.clock.advance(Duration::hours(23) + Duration::minutes(59));
    assert!(h.services.reports.can_edit(&alice, report.id).await.unwrap());

    h.clock.advance(Duration::minutes(1));
    assert!(!h.services.reports.can_edit(&alice, report.id).await.unwrap());
    let late = h.services.reports.apply_edit(&alice, report.id, edit()).await;
    assert!(matches!(late, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn invalid_edit_keeps_the_grant() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let report = submit(&h, &alice).await;
    grant(&h, &alice, &report).await;

    let mut bad = edit();
    bad.tasks_completed.clear();
    let result = h.services.reports.apply_edit(&alice, report.id, bad).await;
    assert!(matches!(result, Err(CoreError::Validation(_))));
    assert!(h.services.reports.can_edit(&alice, report.id).await.unwrap());
}

#[tokio::test]
async fn edit_requests_are_owner_only_and_bounded() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let bob = h.employee("Bob Jones").await;
    let report = submit(&h, &alice).await;

    let foreign = h
        .services
        .edit_requests
        .submit(
            &bob,
            EditSubmission {
                report_id: report.id,
                reason: "Let me".to_string(),
            },
        )
        .await;
    assert!(matches!(foreign, Err(CoreError::Forbidden(_))));

    let too_long = h
        .services
        .edit_requests
        .submit(
            &alice,
            EditSubmission {
                report_id: report.id,
                reason: "r".repeat(501),
            },
        )
        .await;
    assert!(matches!(too_long, Err(CoreError::Validation(_))));

    let request = h
        .services
        .edit_requests
        .submit(
            &alice,
            EditSubmission {
                report_id: report.id,
                reason: "r".repeat(500),
            },
        )
        .await
        .unwrap();
    assert!(request.edit_deadline.is_none());

    let duplicate = h
        .services
        .edit_requests
        .submit(
            &alice,
            EditSubmission {
                report_id: report.id,
                reason: "Again".to_string(),
            },
        )
        .await;
    assert!(matches!(duplicate, Err(CoreError::Conflict(_))));

    let approved = h
        .services
        .edit_requests
        .approve(&h.admin, request.id)
        .await
        .unwrap();
    assert_eq!(
        approved.edit_deadline,
        Some(common::start_instant() + Duration::hours(24))
    );

    let listed = h
        .services
        .edit_requests
        .list(&alice, RequestFilter::default())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(
        listed[0].subject_label,
        Some(report.report_date.to_string())
    );
    assert_eq!(listed[0].reviewer_name.as_deref(), Some("Ada Admin"));
}

#[tokio::test]
async fn employees_see_only_their_reports() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let bob = h.employee("Bob Jones").await;
    submit(&h, &alice).await;
    let bobs = submit(&h, &bob).await;

    let forbidden = h.services.reports.get(&alice, bobs.id).await;
    assert!(matches!(forbidden, Err(CoreError::Forbidden(_))));

    let mine = h
        .services
        .reports
        .list(
            &alice,
            ReportFilter {
                user_id: Some(bob.user_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].report.user_id, alice.user_id);

    let all = h
        .services
        .reports
        .list(&h.admin, ReportFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(h.services.reports.get(&h.admin, bobs.id).await.is_ok());
}

#[tokio::test]
async fn edit_consumes_the_grant_with_the_latest_deadline() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let report = submit(&h, &alice).await;

    let earlier = grant(&h, &alice, &report).await;
    h.clock.advance(Duration::hours(1));
    let later = grant(&h, &alice, &report).await;
    assert!(later.edit_deadline > earlier.edit_deadline);

    h.services
        .reports
        .apply_edit(&alice, report.id, edit())
        .await
        .unwrap();

    let remaining = h
        .services
        .edit_requests
        .list(
            &alice,
            RequestFilter {
                status: Some(RequestStatus::Approved),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let ids: Vec<_> = remaining.iter().map(|v| v.request.id).collect();
    assert_eq!(ids, vec![earlier.id]);

    // The earlier grant is still live, so one more edit goes through.
    assert!(h.services.reports.can_edit(&alice, report.id).await.unwrap());
}
