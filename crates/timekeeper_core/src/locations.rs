//! crates/timekeeper_core/src/locations.rs
//!
//! GPS location log. Records are appended and never changed.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::clock::{day_end, day_start};
use crate::domain::{LocationRecord, LocationStatus};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, DatabaseService, LocationQuery, StoreTx};
use crate::validation::check_coordinates;
use crate::viewer::Viewer;

#[derive(Debug, Clone)]
pub struct NewLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    /// `"active"` (default) or `"paused"`.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    pub user_id: Option<Uuid>,
    /// Defaults to today.
    pub start_date: Option<NaiveDate>,
    /// Defaults to today.
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct LocationView {
    pub record: LocationRecord,
    pub user_name: Option<String>,
}

async fn with_names(
    tx: &mut dyn StoreTx,
    records: Vec<LocationRecord>,
) -> CoreResult<Vec<LocationView>> {
    let mut ids: Vec<Uuid> = records.iter().map(|r| r.user_id).collect();
    ids.sort();
    ids.dedup();
    let names = tx.user_names(&ids).await?;
    Ok(records
        .into_iter()
        .map(|record| LocationView {
            user_name: names.get(&record.user_id).cloned(),
            record,
        })
        .collect())
}

#[derive(Clone)]
pub struct LocationService {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
}

impl LocationService {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn record(&self, viewer: &Viewer, input: NewLocation) -> CoreResult<LocationRecord> {
        check_coordinates(input.latitude, input.longitude)?;
        let status = match input.status.as_deref() {
            Some(value) => value
                .parse::<LocationStatus>()
                .map_err(|_| CoreError::validation("Status must be either active or paused"))?,
            None => LocationStatus::Active,
        };

        let record = LocationRecord {
            id: Uuid::new_v4(),
            user_id: viewer.user_id,
            latitude: input.latitude,
            longitude: input.longitude,
            accuracy: input.accuracy,
            status,
            timestamp: self.clock.now(),
        };
        let mut tx = self.db.begin().await?;
        tx.insert_location(&record).await?;
        tx.commit().await?;

        debug!(user_id = %viewer.user_id, status = status.as_str(), "location recorded");
        Ok(record)
    }

    /// Records within whole days `[start, end]`, newest first.
    pub async fn list(&self, viewer: &Viewer, filter: LocationFilter) -> CoreResult<Vec<LocationView>> {
        let today = self.clock.today();
        let query = LocationQuery {
            user_id: viewer.scope(filter.user_id),
            from: Some(day_start(filter.start_date.unwrap_or(today))),
            to: Some(day_end(filter.end_date.unwrap_or(today))),
            limit: None,
        };
        let mut tx = self.db.begin().await?;
        let records = tx.list_locations(&query).await?;
        let views = with_names(tx.as_mut(), records).await?;
        tx.commit().await?;
        Ok(views)
    }

    /// Most recent position of each user. Admin only.
    pub async fn latest(&self, viewer: &Viewer, user_id: Option<Uuid>) -> CoreResult<Vec<LocationView>> {
        viewer.require_admin()?;
        let mut tx = self.db.begin().await?;
        let records = tx.latest_locations(user_id).await?;
        let views = with_names(tx.as_mut(), records).await?;
        tx.commit().await?;
        Ok(views)
    }
}
