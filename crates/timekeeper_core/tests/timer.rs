mod common;

use chrono::Duration;
use common::Harness;
use timekeeper_core::timer::{ManualEntry, TimeEntryFilter};
use timekeeper_core::{CoreError, EntryType};

fn manual(project_id: uuid::Uuid, hours: f64, minutes: f64) -> ManualEntry {
    ManualEntry {
        project_id,
        task_description: "Paperwork".to_string(),
        entry_date: common::start_instant().date_naive(),
        hours,
        minutes,
    }
}

#[tokio::test]
async fn stop_records_whole_elapsed_minutes() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    h.assign(&alice, project.id).await;

    let started = h
        .services
        .timer
        .start(&alice, project.id, "Wiring".to_string())
        .await
        .unwrap();
    assert_eq!(started.entry.entry_type, EntryType::Timer);
    assert_eq!(started.entry.duration_minutes, 0);
    assert_eq!(started.project_name.as_deref(), Some("Apollo"));

    h.clock.advance(Duration::seconds(150 * 60 + 59));
    let active = h.services.timer.active(&alice).await.unwrap().unwrap();
    assert_eq!(active.elapsed_seconds, 150 * 60 + 59);

    let stopped = h.services.timer.stop(&alice, started.entry.id).await.unwrap();
    assert_eq!(stopped.entry.duration_minutes, 150);
    assert!(stopped.entry.end_time.is_some());
    assert!(h.services.timer.active(&alice).await.unwrap().is_none());

    let again = h.services.timer.stop(&alice, started.entry.id).await;
    assert!(matches!(again, Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn only_one_timer_runs_per_user() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let apollo = h.project("Apollo").await;
    let gemini = h.project("Gemini").await;
    h.assign(&alice, apollo.id).await;
    h.assign(&alice, gemini.id).await;

    h.services
        .timer
        .start(&alice, apollo.id, "First".to_string())
        .await
        .unwrap();
    let second = h
        .services
        .timer
        .start(&alice, gemini.id, "Second".to_string())
        .await;
    assert!(matches!(second, Err(CoreError::Conflict(_))));
}

#[tokio::test]
async fn timers_need_an_assignment() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;

    let started = h
        .services
        .timer
        .start(&alice, project.id, "Sneaky".to_string())
        .await;
    assert!(matches!(started, Err(CoreError::Forbidden(_))));

    let added = h.services.timer.add_manual(&alice, manual(project.id, 1.0, 0.0)).await;
    assert!(matches!(added, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn another_users_timer_cannot_be_stopped() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let bob = h.employee("Bob Jones").await;
    let project = h.project("Apollo").await;
    h.assign(&alice, project.id).await;

    let started = h
        .services
        .timer
        .start(&alice, project.id, "Mine".to_string())
        .await
        .unwrap();
    let stopped = h.services.timer.stop(&bob, started.entry.id).await;
    assert!(matches!(stopped, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn manual_entries_are_bounded_to_one_day() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    h.assign(&alice, project.id).await;

    let too_long = h.services.timer.add_manual(&alice, manual(project.id, 25.0, 0.0)).await;
    assert!(matches!(too_long, Err(CoreError::Validation(_))));

    let full_day = h
        .services
        .timer
        .add_manual(&alice, manual(project.id, 24.0, 0.0))
        .await
        .unwrap();
    assert_eq!(full_day.entry.duration_minutes, 1440);
    assert_eq!(full_day.entry.entry_type, EntryType::Manual);
    assert!(full_day.entry.start_time.is_none());

    let mut future = manual(project.id, 1.0, 0.0);
    future.entry_date = future.entry_date + Duration::days(1);
    let future = h.services.timer.add_manual(&alice, future).await;
    assert!(matches!(future, Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn listing_totals_and_scoping() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let bob = h.employee("Bob Jones").await;
    let project = h.project("Apollo").await;
    h.assign(&alice, project.id).await;
    h.assign(&bob, project.id).await;

    h.services
        .timer
        .add_manual(&alice, manual(project.id, 1.0, 30.0))
        .await
        .unwrap();
    h.services
        .timer
        .add_manual(&alice, manual(project.id, 0.0, 15.0))
        .await
        .unwrap();
    h.services
        .timer
        .add_manual(&bob, manual(project.id, 2.0, 0.0))
        .await
        .unwrap();

    // Asking for Bob's entries as Alice still only yields Alice's.
    let mine = h
        .services
        .timer
        .list(
            &alice,
            TimeEntryFilter {
                user_id: Some(bob.user_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(mine.total_entries, 2);
    assert_eq!(mine.total_hours, 1.75);
    assert!(mine.entries.iter().all(|e| e.entry.user_id == alice.user_id));

    let everyone = h
        .services
        .timer
        .list(&h.admin, TimeEntryFilter::default())
        .await
        .unwrap();
    assert_eq!(everyone.total_entries, 3);
    assert_eq!(everyone.total_hours, 3.75);
}
