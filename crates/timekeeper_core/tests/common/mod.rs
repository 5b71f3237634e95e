#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use timekeeper_core::{
    AccessSubmission, Clock, CredentialHasher, ManualClock, MemoryStore, PortResult, Project,
    Registration, Services, Viewer,
};
use timekeeper_core::projects::NewProject;

pub const PASSWORD: &str = "Secret123";

/// Stores passwords with a visible prefix so tests stay fast.
pub struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> PortResult<String> {
        Ok(format!("plain:{password}"))
    }

    fn verify(&self, password: &str, password_hash: &str) -> bool {
        password_hash == format!("plain:{password}")
    }
}

/// Tuesday morning.
pub fn start_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap()
}

pub struct Harness {
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub services: Services,
    pub admin: Viewer,
}

impl Harness {
    /// A fresh store whose first registered account is the admin.
    pub async fn start() -> Self {
        let store = MemoryStore::new();
        let clock = Arc::new(ManualClock::new(start_instant()));
        let services = Services::new(
            Arc::new(store.clone()),
            clock.clone(),
            Arc::new(PlainHasher),
        );
        let admin = services
            .accounts
            .register(Registration {
                email: "admin@example.com".to_string(),
                password: PASSWORD.to_string(),
                full_name: "Ada Admin".to_string(),
            })
            .await
            .unwrap();
        Self {
            store,
            clock,
            services,
            admin: Viewer::new(admin.id, admin.role),
        }
    }

    pub fn clock_today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub async fn employee(&self, name: &str) -> Viewer {
        let user = self
            .services
            .accounts
            .register(Registration {
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                password: PASSWORD.to_string(),
                full_name: name.to_string(),
            })
            .await
            .unwrap();
        Viewer::new(user.id, user.role)
    }

    pub async fn project(&self, name: &str) -> Project {
        self.services
            .projects
            .create(
                &self.admin,
                NewProject {
                    name: name.to_string(),
                    description: None,
                    status: None,
                },
            )
            .await
            .unwrap()
    }

    /// Runs a full access request round so `viewer` is assigned to `project_id`.
    pub async fn assign(&self, viewer: &Viewer, project_id: Uuid) {
        let request = self
            .services
            .access_requests
            .submit(viewer, AccessSubmission { project_id })
            .await
            .unwrap();
        self.services
            .access_requests
            .approve(&self.admin, request.id)
            .await
            .unwrap();
    }
}
