//! Station repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Station, StationFilter, StationStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait StationRepository: Send + Sync {
    /// Insert a new station
    async fn save(&self, station: Station) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Station>>;

    /// Replace an existing station
    async fn update(&self, station: Station) -> DomainResult<()>;

    // Single-column writes; other fields are left as stored.

    async fn update_available_slots(
        &self,
        id: &str,
        available_slots: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;

    async fn update_capacity(
        &self,
        id: &str,
        total_slots: i32,
        available_slots: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;

    async fn update_status(&self, id: &str, status: StationStatus, at: DateTime<Utc>) -> DomainResult<()>;

    /// Stations matching the filter, oldest first
    async fn find(&self, filter: &StationFilter) -> DomainResult<Vec<Station>>;
}
