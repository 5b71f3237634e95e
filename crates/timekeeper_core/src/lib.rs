pub mod access_requests;
pub mod accounts;
pub mod clock;
pub mod dashboard;
pub mod domain;
pub mod edit_requests;
pub mod employees;
pub mod error;
pub mod locations;
pub mod memory;
pub mod ports;
pub mod projects;
pub mod reports;
pub mod timer;
pub mod validation;
pub mod viewer;
pub mod workflow;

use std::sync::Arc;

pub use access_requests::{AccessRequestEngine, AccessSubmission, AccessWorkflow};
pub use accounts::{AccountService, Registration};
pub use clock::{ManualClock, SystemClock};
pub use dashboard::DashboardService;
pub use domain::{
    AccessRequest, ActivityFilter, DailyReport, EntryType, LocationRecord, LocationStatus,
    Project, ProjectAssignment, ProjectStatus, ReportEditRequest, RequestStatus, Review, Role,
    TimeEntry, User, UserCredentials,
};
pub use edit_requests::{EditRequestEngine, EditSubmission, EditWorkflow};
pub use employees::EmployeeService;
pub use error::{CoreError, CoreResult};
pub use locations::LocationService;
pub use memory::MemoryStore;
pub use ports::{Clock, CredentialHasher, DatabaseService, PortError, PortResult, StoreTx};
pub use projects::ProjectService;
pub use reports::ReportService;
pub use timer::TimerService;
pub use viewer::Viewer;
pub use workflow::{ApprovalEngine, RequestFilter, RequestView};

/// Every core service wired against one store, clock and hasher.
#[derive(Clone)]
pub struct Services {
    pub accounts: AccountService,
    pub employees: EmployeeService,
    pub projects: ProjectService,
    pub access_requests: AccessRequestEngine,
    pub edit_requests: EditRequestEngine,
    pub reports: ReportService,
    pub timer: TimerService,
    pub locations: LocationService,
    pub dashboard: DashboardService,
}

impl Services {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        clock: Arc<dyn Clock>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            accounts: AccountService::new(db.clone(), clock.clone(), hasher.clone()),
            employees: EmployeeService::new(db.clone(), clock.clone(), hasher),
            projects: ProjectService::new(db.clone(), clock.clone()),
            access_requests: ApprovalEngine::new(db.clone(), clock.clone(), AccessWorkflow),
            edit_requests: ApprovalEngine::new(db.clone(), clock.clone(), EditWorkflow),
            reports: ReportService::new(db.clone(), clock.clone()),
            timer: TimerService::new(db.clone(), clock.clone()),
            locations: LocationService::new(db.clone(), clock.clone()),
            dashboard: DashboardService::new(db, clock),
        }
    }
}
