mod common;

use common::{Harness, PASSWORD};
use timekeeper_core::employees::{EmployeeChanges, EmployeeFilter, NewEmployee};
use timekeeper_core::{ActivityFilter, CoreError, Registration, Role};

#[tokio::test]
async fn first_account_is_admin_and_later_ones_are_not() {
    let h = Harness::start().await;
    assert_eq!(h.admin.role, Role::Admin);
    let alice = h.employee("Alice Smith").await;
    assert_eq!(alice.role, Role::Employee);
}

#[tokio::test]
async fn registration_rules() {
    let h = Harness::start().await;
    let register = |email: &str, password: &str, name: &str| Registration {
        email: email.to_string(),
        password: password.to_string(),
        full_name: name.to_string(),
    };

    for input in [
        register("not-an-email", PASSWORD, "Alice Smith"),
        register("a@example.com", "short1A", "Alice Smith"),
        register("a@example.com", "alllowercase1", "Alice Smith"),
        register("a@example.com", PASSWORD, "A"),
    ] {
        let result = h.services.accounts.register(input).await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    let taken = h
        .services
        .accounts
        .register(register("ADMIN@example.com", PASSWORD, "Someone Else"))
        .await;
    assert!(matches!(taken, Err(CoreError::Conflict(_))));
}

#[tokio::test]
async fn login_checks_password_and_status() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;

    let user = h
        .services
        .accounts
        .login("Alice.Smith@example.com", PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.id, alice.user_id);

    let wrong = h
        .services
        .accounts
        .login("alice.smith@example.com", "Wrong1234")
        .await;
    assert!(matches!(wrong, Err(CoreError::Unauthorized(_))));
    let unknown = h.services.accounts.login("nobody@example.com", PASSWORD).await;
    assert!(matches!(unknown, Err(CoreError::Unauthorized(_))));

    h.services
        .employees
        .archive(&h.admin, alice.user_id)
        .await
        .unwrap();
    let archived = h
        .services
        .accounts
        .login("alice.smith@example.com", PASSWORD)
        .await;
    assert!(matches!(archived, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn admins_manage_the_roster() {
    let h = Harness::start().await;
    let created = h
        .services
        .employees
        .create(
            &h.admin,
            NewEmployee {
                email: "carol@example.com".to_string(),
                password: PASSWORD.to_string(),
                full_name: "Carol White".to_string(),
                role: None,
                is_active: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(created.role, Role::Employee);
    assert!(created.is_active);

    let bad_role = h
        .services
        .employees
        .update(
            &h.admin,
            created.id,
            EmployeeChanges {
                role: Some("owner".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(bad_role, Err(CoreError::Validation(_))));

    let empty = h
        .services
        .employees
        .update(&h.admin, created.id, EmployeeChanges::default())
        .await;
    assert!(matches!(empty, Err(CoreError::Validation(_))));

    let updated = h
        .services
        .employees
        .update(
            &h.admin,
            created.id,
            EmployeeChanges {
                full_name: Some("Carol Black".to_string()),
                password: Some("Another123".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Carol Black");
    h.services
        .accounts
        .login("carol@example.com", "Another123")
        .await
        .unwrap();

    let self_archive = h.services.employees.archive(&h.admin, h.admin.user_id).await;
    assert!(matches!(self_archive, Err(CoreError::Validation(_))));

    h.services
        .employees
        .archive(&h.admin, created.id)
        .await
        .unwrap();
    let active = h
        .services
        .employees
        .list(&h.admin, EmployeeFilter::default())
        .await
        .unwrap();
    assert!(active.iter().all(|e| e.user.id != created.id));
    let inactive = h
        .services
        .employees
        .list(
            &h.admin,
            EmployeeFilter {
                status: ActivityFilter::Inactive,
                search: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].user.id, created.id);
}

#[tokio::test]
async fn roster_search_and_access() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    h.employee("Bob Jones").await;

    let found = h
        .services
        .employees
        .list(
            &h.admin,
            EmployeeFilter {
                status: ActivityFilter::All,
                search: Some("JONES".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].user.full_name, "Bob Jones");

    let denied = h
        .services
        .employees
        .list(&alice, EmployeeFilter::default())
        .await;
    assert!(matches!(denied, Err(CoreError::Forbidden(_))));
}

#[tokio::test]
async fn employee_detail_rolls_up_work() {
    let h = Harness::start().await;
    let alice = h.employee("Alice Smith").await;
    let project = h.project("Apollo").await;
    h.assign(&alice, project.id).await;
    h.services
        .timer
        .add_manual(
            &alice,
            timekeeper_core::timer::ManualEntry {
                project_id: project.id,
                task_description: "Docs".to_string(),
                entry_date: h.clock_today(),
                hours: 2.0,
                minutes: 0.0,
            },
        )
        .await
        .unwrap();

    let detail = h
        .services
        .employees
        .detail(&h.admin, alice.user_id)
        .await
        .unwrap();
    assert_eq!(detail.stats.hours_today, 2.0);
    assert_eq!(detail.stats.hours_this_week, 2.0);
    assert_eq!(detail.stats.active_projects, 1);
    assert_eq!(detail.assigned_projects.len(), 1);
    assert_eq!(detail.recent_time_entries.len(), 1);
    assert!(detail.current_location.is_none());

    let me = h.services.accounts.me(&alice).await.unwrap();
    assert_eq!(me.full_name, "Alice Smith");
}
