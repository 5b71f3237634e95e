//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`. Every unit of work runs inside one
//! Postgres transaction; dropping it without commit rolls everything back.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use timekeeper_core::domain::{
    AccessRequest, DailyReport, LocationRecord, Project, ProjectAssignment, ProjectStatus,
    ReportEditRequest, Review, TimeEntry, User, UserCredentials,
};
use timekeeper_core::ports::{
    DatabaseService, LocationQuery, PortError, PortResult, ReportQuery, RequestQuery, StoreTx,
    TimeEntryQuery, UserQuery,
};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn begin(&self) -> PortResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await.map_err(map_db_err)?;
        Ok(Box::new(DbTx { tx }))
    }
}

/// One open Postgres transaction.
pub struct DbTx {
    tx: Transaction<'static, Postgres>,
}

impl DbTx {
    fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

/// Unique violations become `Conflict`; everything else is unexpected.
fn map_db_err(e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return PortError::Conflict(
                db.constraint().unwrap_or("unique constraint").to_string(),
            );
        }
    }
    PortError::Unexpected(e.to_string())
}

fn parse<T: FromStr>(value: &str) -> PortResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| PortError::Unexpected(e.to_string()))
}

fn expect_one(rows: u64, what: &str, id: Uuid) -> PortResult<()> {
    if rows == 0 {
        return Err(PortError::NotFound(format!("{what} {id} not found")));
    }
    Ok(())
}

fn limit(value: Option<usize>) -> Option<i64> {
    value.map(|l| l as i64)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, email, full_name, role, is_active, created_at, updated_at";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    full_name: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl UserRecord {
    fn into_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id,
            email: self.email,
            full_name: self.full_name,
            role: parse(&self.role)?,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

struct CredentialsRecord {
    user: UserRecord,
    password_hash: String,
}
impl<'r> FromRow<'r, PgRow> for CredentialsRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        Ok(Self {
            user: UserRecord::from_row(row)?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

const PROJECT_COLUMNS: &str = "id, name, description, status, created_by, created_at, updated_at";

#[derive(FromRow)]
struct ProjectRecord {
    id: Uuid,
    name: String,
    description: Option<String>,
    status: String,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ProjectRecord {
    fn into_domain(self) -> PortResult<Project> {
        Ok(Project {
            id: self.id,
            name: self.name,
            description: self.description,
            status: parse(&self.status)?,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AssignmentRecord {
    id: Uuid,
    project_id: Uuid,
    user_id: Uuid,
    assigned_at: DateTime<Utc>,
}
impl AssignmentRecord {
    fn into_domain(self) -> ProjectAssignment {
        ProjectAssignment {
            id: self.id,
            project_id: self.project_id,
            user_id: self.user_id,
            assigned_at: self.assigned_at,
        }
    }
}

const ACCESS_REQUEST_COLUMNS: &str =
    "id, project_id, user_id, status, requested_at, reviewed_by, reviewed_at, rejection_reason";

#[derive(FromRow)]
struct AccessRequestRecord {
    id: Uuid,
    project_id: Uuid,
    user_id: Uuid,
    status: String,
    requested_at: DateTime<Utc>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
}
impl AccessRequestRecord {
    fn into_domain(self) -> PortResult<AccessRequest> {
        Ok(AccessRequest {
            id: self.id,
            project_id: self.project_id,
            user_id: self.user_id,
            requested_at: self.requested_at,
            review: Review {
                status: parse(&self.status)?,
                reviewed_by: self.reviewed_by,
                reviewed_at: self.reviewed_at,
                rejection_reason: self.rejection_reason,
            },
        })
    }
}

const EDIT_REQUEST_COLUMNS: &str = "id, report_id, user_id, reason, status, requested_at, \
     reviewed_by, reviewed_at, rejection_reason, edit_deadline";

#[derive(FromRow)]
struct EditRequestRecord {
    id: Uuid,
    report_id: Uuid,
    user_id: Uuid,
    reason: String,
    status: String,
    requested_at: DateTime<Utc>,
    reviewed_by: Option<Uuid>,
    reviewed_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    edit_deadline: Option<DateTime<Utc>>,
}
impl EditRequestRecord {
    fn into_domain(self) -> PortResult<ReportEditRequest> {
        Ok(ReportEditRequest {
            id: self.id,
            report_id: self.report_id,
            user_id: self.user_id,
            reason: self.reason,
            requested_at: self.requested_at,
            review: Review {
                status: parse(&self.status)?,
                reviewed_by: self.reviewed_by,
                reviewed_at: self.reviewed_at,
                rejection_reason: self.rejection_reason,
            },
            edit_deadline: self.edit_deadline,
        })
    }
}

const REPORT_COLUMNS: &str =
    "id, user_id, report_date, tasks_completed, hours_worked, notes, created_at, updated_at";

#[derive(FromRow)]
struct ReportRecord {
    id: Uuid,
    user_id: Uuid,
    report_date: NaiveDate,
    tasks_completed: Vec<String>,
    hours_worked: f64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ReportRecord {
    fn into_domain(self) -> DailyReport {
        DailyReport {
            id: self.id,
            user_id: self.user_id,
            report_date: self.report_date,
            tasks_completed: self.tasks_completed,
            hours_worked: self.hours_worked,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const TIME_ENTRY_COLUMNS: &str = "id, user_id, project_id, task_description, entry_type, \
     entry_date, start_time, end_time, duration_minutes, created_at, updated_at";

#[derive(FromRow)]
struct TimeEntryRecord {
    id: Uuid,
    user_id: Uuid,
    project_id: Uuid,
    task_description: String,
    entry_type: String,
    entry_date: NaiveDate,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    duration_minutes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl TimeEntryRecord {
    fn into_domain(self) -> PortResult<TimeEntry> {
        Ok(TimeEntry {
            id: self.id,
            user_id: self.user_id,
            project_id: self.project_id,
            task_description: self.task_description,
            entry_type: parse(&self.entry_type)?,
            entry_date: self.entry_date,
            start_time: self.start_time,
            end_time: self.end_time,
            duration_minutes: self.duration_minutes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const LOCATION_COLUMNS: &str = "id, user_id, latitude, longitude, accuracy, status, recorded_at";

#[derive(FromRow)]
struct LocationRecordRow {
    id: Uuid,
    user_id: Uuid,
    latitude: f64,
    longitude: f64,
    accuracy: Option<f64>,
    status: String,
    recorded_at: DateTime<Utc>,
}
impl LocationRecordRow {
    fn into_domain(self) -> PortResult<LocationRecord> {
        Ok(LocationRecord {
            id: self.id,
            user_id: self.user_id,
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.accuracy,
            status: parse(&self.status)?,
            timestamp: self.recorded_at,
        })
    }
}

/// Shared filter for the time entry listing and its sum.
const TIME_ENTRY_FILTER: &str = "($1::uuid IS NULL OR user_id = $1) \
     AND ($2::uuid IS NULL OR project_id = $2) \
     AND ($3::date IS NULL OR entry_date >= $3) \
     AND ($4::date IS NULL OR entry_date <= $4) \
     AND (NOT $5 OR NOT (entry_type = 'timer' AND end_time IS NULL))";

const REQUEST_FILTER: &str = "($1::text IS NULL OR status = $1) \
     AND ($2::uuid IS NULL OR user_id = $2)";

//=========================================================================================
// `StoreTx` Trait Implementation
//=========================================================================================

#[async_trait]
impl StoreTx for DbTx {
    async fn commit(self: Box<Self>) -> PortResult<()> {
        self.tx.commit().await.map_err(map_db_err)
    }

    // --- Users ---

    async fn count_users(&mut self) -> PortResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.conn())
            .await
            .map_err(map_db_err)
    }

    async fn insert_user(&mut self, user: &User, password_hash: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, full_name, role, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn get_user(&mut self, id: Uuid) -> PortResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(self.conn())
            .await
            .map_err(map_db_err)?
            .map(UserRecord::into_domain)
            .transpose()
    }

    async fn get_credentials_by_email(
        &mut self,
        email: &str,
    ) -> PortResult<Option<UserCredentials>> {
        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");
        let Some(record) = sqlx::query_as::<_, CredentialsRecord>(&sql)
            .bind(email)
            .fetch_optional(self.conn())
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };
        Ok(Some(UserCredentials {
            user: record.user.into_domain()?,
            password_hash: record.password_hash,
        }))
    }

    async fn update_user(&mut self, user: &User) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, full_name = $3, role = $4, is_active = $5, updated_at = $6 \
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.updated_at)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        expect_one(result.rows_affected(), "User", user.id)
    }

    async fn set_password_hash(&mut self, user_id: Uuid, password_hash: &str) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(self.conn())
            .await
            .map_err(map_db_err)?;
        expect_one(result.rows_affected(), "User", user_id)
    }

    async fn list_users(&mut self, query: &UserQuery) -> PortResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::boolean IS NULL OR is_active = $1) \
               AND ($2::text IS NULL OR role = $2) \
               AND ($3::text IS NULL OR full_name ILIKE ('%' || $3 || '%') OR email ILIKE ('%' || $3 || '%')) \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(query.active)
            .bind(query.role.map(|r| r.as_str()))
            .bind(query.search.as_deref().map(str::trim))
            .fetch_all(self.conn())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(UserRecord::into_domain)
            .collect()
    }

    async fn user_names(&mut self, ids: &[Uuid]) -> PortResult<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, full_name FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().collect())
    }

    async fn last_activity(&mut self, user_id: Uuid) -> PortResult<Option<DateTime<Utc>>> {
        sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT GREATEST( \
                (SELECT MAX(recorded_at) FROM location_records WHERE user_id = $1), \
                (SELECT MAX(created_at) FROM time_entries WHERE user_id = $1))",
        )
        .bind(user_id)
        .fetch_one(self.conn())
        .await
        .map_err(map_db_err)
    }

    // --- Projects ---

    async fn insert_project(&mut self, project: &Project) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO projects (id, name, description, status, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.created_by)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn get_project(&mut self, id: Uuid) -> PortResult<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRecord>(&sql)
            .bind(id)
            .fetch_optional(self.conn())
            .await
            .map_err(map_db_err)?
            .map(ProjectRecord::into_domain)
            .transpose()
    }

    async fn get_project_by_name(&mut self, name: &str) -> PortResult<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE name = $1");
        sqlx::query_as::<_, ProjectRecord>(&sql)
            .bind(name)
            .fetch_optional(self.conn())
            .await
            .map_err(map_db_err)?
            .map(ProjectRecord::into_domain)
            .transpose()
    }

    async fn update_project(&mut self, project: &Project) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE projects SET name = $2, description = $3, status = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.updated_at)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        expect_one(result.rows_affected(), "Project", project.id)
    }

    async fn list_projects(&mut self, status: Option<ProjectStatus>) -> PortResult<Vec<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, ProjectRecord>(&sql)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(self.conn())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(ProjectRecord::into_domain)
            .collect()
    }

    async fn project_names(&mut self, ids: &[Uuid]) -> PortResult<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, name FROM projects WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().collect())
    }

    // --- Assignments ---

    async fn get_assignment(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<Option<ProjectAssignment>> {
        let record = sqlx::query_as::<_, AssignmentRecord>(
            "SELECT id, project_id, user_id, assigned_at FROM project_assignments \
             WHERE project_id = $1 AND user_id = $2",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(record.map(AssignmentRecord::into_domain))
    }

    async fn insert_assignment(&mut self, assignment: &ProjectAssignment) -> PortResult<bool> {
        let result = sqlx::query(
            "INSERT INTO project_assignments (id, project_id, user_id, assigned_at) \
             VALUES ($1, $2, $3, $4) ON CONFLICT (project_id, user_id) DO NOTHING",
        )
        .bind(assignment.id)
        .bind(assignment.project_id)
        .bind(assignment.user_id)
        .bind(assignment.assigned_at)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_assignment(&mut self, project_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        let result =
            sqlx::query("DELETE FROM project_assignments WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(self.conn())
                .await
                .map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_assignments(
        &mut self,
        project_id: Option<Uuid>,
        user_id: Option<Uuid>,
    ) -> PortResult<Vec<ProjectAssignment>> {
        let records = sqlx::query_as::<_, AssignmentRecord>(
            "SELECT id, project_id, user_id, assigned_at FROM project_assignments \
             WHERE ($1::uuid IS NULL OR project_id = $1) AND ($2::uuid IS NULL OR user_id = $2) \
             ORDER BY assigned_at DESC",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_all(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(records.into_iter().map(AssignmentRecord::into_domain).collect())
    }

    // --- Project Access Requests ---

    async fn insert_access_request(&mut self, request: &AccessRequest) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO project_access_requests \
             (id, project_id, user_id, status, requested_at, reviewed_by, reviewed_at, rejection_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(request.id)
        .bind(request.project_id)
        .bind(request.user_id)
        .bind(request.review.status.as_str())
        .bind(request.requested_at)
        .bind(request.review.reviewed_by)
        .bind(request.review.reviewed_at)
        .bind(&request.review.rejection_reason)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn lock_access_request(&mut self, id: Uuid) -> PortResult<Option<AccessRequest>> {
        let sql = format!(
            "SELECT {ACCESS_REQUEST_COLUMNS} FROM project_access_requests WHERE id = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, AccessRequestRecord>(&sql)
            .bind(id)
            .fetch_optional(self.conn())
            .await
            .map_err(map_db_err)?
            .map(AccessRequestRecord::into_domain)
            .transpose()
    }

    async fn update_access_request(&mut self, request: &AccessRequest) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE project_access_requests \
             SET status = $2, reviewed_by = $3, reviewed_at = $4, rejection_reason = $5 \
             WHERE id = $1",
        )
        .bind(request.id)
        .bind(request.review.status.as_str())
        .bind(request.review.reviewed_by)
        .bind(request.review.reviewed_at)
        .bind(&request.review.rejection_reason)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        expect_one(result.rows_affected(), "Access request", request.id)
    }

    async fn list_access_requests(
        &mut self,
        query: &RequestQuery,
    ) -> PortResult<Vec<AccessRequest>> {
        let sql = format!(
            "SELECT {ACCESS_REQUEST_COLUMNS} FROM project_access_requests \
             WHERE {REQUEST_FILTER} AND ($3::uuid IS NULL OR project_id = $3) \
             ORDER BY requested_at DESC LIMIT $4"
        );
        sqlx::query_as::<_, AccessRequestRecord>(&sql)
            .bind(query.status.map(|s| s.as_str()))
            .bind(query.user_id)
            .bind(query.subject_id)
            .bind(limit(query.limit))
            .fetch_all(self.conn())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(AccessRequestRecord::into_domain)
            .collect()
    }

    // --- Report Edit Requests ---

    async fn insert_edit_request(&mut self, request: &ReportEditRequest) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO report_edit_requests \
             (id, report_id, user_id, reason, status, requested_at, reviewed_by, reviewed_at, \
              rejection_reason, edit_deadline) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(request.id)
        .bind(request.report_id)
        .bind(request.user_id)
        .bind(&request.reason)
        .bind(request.review.status.as_str())
        .bind(request.requested_at)
        .bind(request.review.reviewed_by)
        .bind(request.review.reviewed_at)
        .bind(&request.review.rejection_reason)
        .bind(request.edit_deadline)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn lock_edit_request(&mut self, id: Uuid) -> PortResult<Option<ReportEditRequest>> {
        let sql = format!(
            "SELECT {EDIT_REQUEST_COLUMNS} FROM report_edit_requests WHERE id = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, EditRequestRecord>(&sql)
            .bind(id)
            .fetch_optional(self.conn())
            .await
            .map_err(map_db_err)?
            .map(EditRequestRecord::into_domain)
            .transpose()
    }

    async fn update_edit_request(&mut self, request: &ReportEditRequest) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE report_edit_requests \
             SET status = $2, reviewed_by = $3, reviewed_at = $4, rejection_reason = $5, \
                 edit_deadline = $6 \
             WHERE id = $1",
        )
        .bind(request.id)
        .bind(request.review.status.as_str())
        .bind(request.review.reviewed_by)
        .bind(request.review.reviewed_at)
        .bind(&request.review.rejection_reason)
        .bind(request.edit_deadline)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        expect_one(result.rows_affected(), "Edit request", request.id)
    }

    async fn delete_edit_request(&mut self, id: Uuid) -> PortResult<()> {
        sqlx::query("DELETE FROM report_edit_requests WHERE id = $1")
            .bind(id)
            .execute(self.conn())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_edit_requests(
        &mut self,
        query: &RequestQuery,
    ) -> PortResult<Vec<ReportEditRequest>> {
        let sql = format!(
            "SELECT {EDIT_REQUEST_COLUMNS} FROM report_edit_requests \
             WHERE {REQUEST_FILTER} AND ($3::uuid IS NULL OR report_id = $3) \
             ORDER BY requested_at DESC LIMIT $4"
        );
        sqlx::query_as::<_, EditRequestRecord>(&sql)
            .bind(query.status.map(|s| s.as_str()))
            .bind(query.user_id)
            .bind(query.subject_id)
            .bind(limit(query.limit))
            .fetch_all(self.conn())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(EditRequestRecord::into_domain)
            .collect()
    }

    // --- Daily Reports ---

    async fn insert_report(&mut self, report: &DailyReport) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO daily_reports \
             (id, user_id, report_date, tasks_completed, hours_worked, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(report.id)
        .bind(report.user_id)
        .bind(report.report_date)
        .bind(&report.tasks_completed)
        .bind(report.hours_worked)
        .bind(&report.notes)
        .bind(report.created_at)
        .bind(report.updated_at)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn get_report(&mut self, id: Uuid) -> PortResult<Option<DailyReport>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM daily_reports WHERE id = $1");
        let record = sqlx::query_as::<_, ReportRecord>(&sql)
            .bind(id)
            .fetch_optional(self.conn())
            .await
            .map_err(map_db_err)?;
        Ok(record.map(ReportRecord::into_domain))
    }

    async fn update_report(&mut self, report: &DailyReport) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE daily_reports \
             SET tasks_completed = $2, hours_worked = $3, notes = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(report.id)
        .bind(&report.tasks_completed)
        .bind(report.hours_worked)
        .bind(&report.notes)
        .bind(report.updated_at)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        expect_one(result.rows_affected(), "Report", report.id)
    }

    async fn list_reports(&mut self, query: &ReportQuery) -> PortResult<Vec<DailyReport>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM daily_reports \
             WHERE ($1::uuid IS NULL OR user_id = $1) \
               AND ($2::date IS NULL OR report_date >= $2) \
               AND ($3::date IS NULL OR report_date <= $3) \
             ORDER BY report_date DESC, created_at DESC LIMIT $4"
        );
        let records = sqlx::query_as::<_, ReportRecord>(&sql)
            .bind(query.user_id)
            .bind(query.from)
            .bind(query.to)
            .bind(limit(query.limit))
            .fetch_all(self.conn())
            .await
            .map_err(map_db_err)?;
        Ok(records.into_iter().map(ReportRecord::into_domain).collect())
    }

    // --- Time Entries ---

    async fn insert_time_entry(&mut self, entry: &TimeEntry) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO time_entries \
             (id, user_id, project_id, task_description, entry_type, entry_date, start_time, \
              end_time, duration_minutes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.project_id)
        .bind(&entry.task_description)
        .bind(entry.entry_type.as_str())
        .bind(entry.entry_date)
        .bind(entry.start_time)
        .bind(entry.end_time)
        .bind(entry.duration_minutes)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn lock_time_entry(&mut self, id: Uuid) -> PortResult<Option<TimeEntry>> {
        let sql = format!("SELECT {TIME_ENTRY_COLUMNS} FROM time_entries WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, TimeEntryRecord>(&sql)
            .bind(id)
            .fetch_optional(self.conn())
            .await
            .map_err(map_db_err)?
            .map(TimeEntryRecord::into_domain)
            .transpose()
    }

    async fn find_open_timer(&mut self, user_id: Uuid) -> PortResult<Option<TimeEntry>> {
        let sql = format!(
            "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries \
             WHERE user_id = $1 AND entry_type = 'timer' AND end_time IS NULL \
             ORDER BY start_time DESC LIMIT 1"
        );
        sqlx::query_as::<_, TimeEntryRecord>(&sql)
            .bind(user_id)
            .fetch_optional(self.conn())
            .await
            .map_err(map_db_err)?
            .map(TimeEntryRecord::into_domain)
            .transpose()
    }

    async fn update_time_entry(&mut self, entry: &TimeEntry) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE time_entries \
             SET task_description = $2, end_time = $3, duration_minutes = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(entry.id)
        .bind(&entry.task_description)
        .bind(entry.end_time)
        .bind(entry.duration_minutes)
        .bind(entry.updated_at)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        expect_one(result.rows_affected(), "Time entry", entry.id)
    }

    async fn list_time_entries(&mut self, query: &TimeEntryQuery) -> PortResult<Vec<TimeEntry>> {
        let sql = format!(
            "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries WHERE {TIME_ENTRY_FILTER} \
             ORDER BY entry_date DESC, created_at DESC LIMIT $6"
        );
        sqlx::query_as::<_, TimeEntryRecord>(&sql)
            .bind(query.user_id)
            .bind(query.project_id)
            .bind(query.from)
            .bind(query.to)
            .bind(query.completed_only)
            .bind(limit(query.limit))
            .fetch_all(self.conn())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(TimeEntryRecord::into_domain)
            .collect()
    }

    async fn sum_duration_minutes(&mut self, query: &TimeEntryQuery) -> PortResult<i64> {
        let sql = format!(
            "SELECT COALESCE(SUM(duration_minutes), 0)::BIGINT FROM time_entries \
             WHERE {TIME_ENTRY_FILTER}"
        );
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(query.user_id)
            .bind(query.project_id)
            .bind(query.from)
            .bind(query.to)
            .bind(query.completed_only)
            .fetch_one(self.conn())
            .await
            .map_err(map_db_err)
    }

    // --- Locations ---

    async fn insert_location(&mut self, record: &LocationRecord) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO location_records \
             (id, user_id, latitude, longitude, accuracy, status, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.accuracy)
        .bind(record.status.as_str())
        .bind(record.timestamp)
        .execute(self.conn())
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn list_locations(&mut self, query: &LocationQuery) -> PortResult<Vec<LocationRecord>> {
        let sql = format!(
            "SELECT {LOCATION_COLUMNS} FROM location_records \
             WHERE ($1::uuid IS NULL OR user_id = $1) \
               AND ($2::timestamptz IS NULL OR recorded_at >= $2) \
               AND ($3::timestamptz IS NULL OR recorded_at <= $3) \
             ORDER BY recorded_at DESC LIMIT $4"
        );
        sqlx::query_as::<_, LocationRecordRow>(&sql)
            .bind(query.user_id)
            .bind(query.from)
            .bind(query.to)
            .bind(limit(query.limit))
            .fetch_all(self.conn())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(LocationRecordRow::into_domain)
            .collect()
    }

    async fn latest_locations(
        &mut self,
        user_id: Option<Uuid>,
    ) -> PortResult<Vec<LocationRecord>> {
        let sql = format!(
            "SELECT * FROM ( \
                SELECT DISTINCT ON (user_id) {LOCATION_COLUMNS} FROM location_records \
                WHERE ($1::uuid IS NULL OR user_id = $1) \
                ORDER BY user_id, recorded_at DESC \
             ) latest ORDER BY recorded_at DESC"
        );
        sqlx::query_as::<_, LocationRecordRow>(&sql)
            .bind(user_id)
            .fetch_all(self.conn())
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(LocationRecordRow::into_domain)
            .collect()
    }
}
