//! Booking repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Booking, BookingFilter, BookingStatus};
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a new booking
    async fn save(&self, booking: Booking) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>>;

    /// Replace an existing booking
    async fn update(&self, booking: Booking) -> DomainResult<()>;

    /// Move a booking from `expected` to `next`. Fails with `Conflict` if
    /// the stored status is no longer `expected`.
    async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;

    /// Physically remove a booking
    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// All bookings matching the filter, oldest first
    async fn find(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>>;

    /// Bookings on `station_id` in one of `statuses` whose interval overlaps
    /// `[start, end)`, optionally ignoring one booking id.
    async fn find_overlapping(
        &self,
        station_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[BookingStatus],
        exclude_id: Option<&str>,
    ) -> DomainResult<Vec<Booking>>;

    /// Number of bookings on `station_id` in one of `statuses` with
    /// `start_time <= at <= end_time`.
    async fn count_active_at(
        &self,
        station_id: &str,
        at: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> DomainResult<u64>;
}
