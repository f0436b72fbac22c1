//! In-memory store with artificial read latency, for interleaving tests.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::memory::{InMemoryBookingRepository, InMemoryStationRepository};
use crate::domain::booking::{Booking, BookingFilter, BookingRepository, BookingStatus};
use crate::domain::station::{Station, StationFilter, StationRepository, StationStatus};
use crate::domain::{DomainResult, RepositoryProvider};

#[derive(Default, Clone, Copy)]
struct Delays {
    find_by_id: Duration,
    count: Duration,
}

async fn pause(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

pub struct SlowBookingRepository {
    inner: InMemoryBookingRepository,
    delays: Delays,
}

#[async_trait]
impl BookingRepository for SlowBookingRepository {
    async fn save(&self, booking: Booking) -> DomainResult<()> {
        self.inner.save(booking).await
    }

    /// Reads, then stalls before handing the row back.
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        let found = self.inner.find_by_id(id).await;
        pause(self.delays.find_by_id).await;
        found
    }

    async fn update(&self, booking: Booking) -> DomainResult<()> {
        self.inner.update(booking).await
    }

    async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.inner.update_status(id, expected, next, at).await
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.inner.delete(id).await
    }

    async fn find(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        self.inner.find(filter).await
    }

    async fn find_overlapping(
        &self,
        station_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[BookingStatus],
        exclude_id: Option<&str>,
    ) -> DomainResult<Vec<Booking>> {
        self.inner
            .find_overlapping(station_id, start, end, statuses, exclude_id)
            .await
    }

    async fn count_active_at(
        &self,
        station_id: &str,
        at: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> DomainResult<u64> {
        pause(self.delays.count).await;
        self.inner.count_active_at(station_id, at, statuses).await
    }
}

pub struct SlowStationRepository {
    inner: InMemoryStationRepository,
    delays: Delays,
}

#[async_trait]
impl StationRepository for SlowStationRepository {
    async fn save(&self, station: Station) -> DomainResult<()> {
        self.inner.save(station).await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Station>> {
        let found = self.inner.find_by_id(id).await;
        pause(self.delays.find_by_id).await;
        found
    }

    async fn update(&self, station: Station) -> DomainResult<()> {
        self.inner.update(station).await
    }

    async fn update_available_slots(
        &self,
        id: &str,
        available_slots: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.inner.update_available_slots(id, available_slots, at).await
    }

    async fn update_capacity(
        &self,
        id: &str,
        total_slots: i32,
        available_slots: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.inner
            .update_capacity(id, total_slots, available_slots, at)
            .await
    }

    async fn update_status(&self, id: &str, status: StationStatus, at: DateTime<Utc>) -> DomainResult<()> {
        self.inner.update_status(id, status, at).await
    }

    async fn find(&self, filter: &StationFilter) -> DomainResult<Vec<Station>> {
        self.inner.find(filter).await
    }
}

pub struct SlowRepositoryProvider {
    bookings: SlowBookingRepository,
    stations: SlowStationRepository,
}

impl SlowRepositoryProvider {
    fn with(delays: Delays) -> Self {
        Self {
            bookings: SlowBookingRepository {
                inner: InMemoryBookingRepository::new(),
                delays,
            },
            stations: SlowStationRepository {
                inner: InMemoryStationRepository::new(),
                delays,
            },
        }
    }

    /// Every `find_by_id` stalls for `delay` after reading.
    pub fn slow_reads(delay: Duration) -> Self {
        Self::with(Delays {
            find_by_id: delay,
            ..Default::default()
        })
    }

    /// Every active-booking count stalls for `delay` first.
    pub fn slow_counts(delay: Duration) -> Self {
        Self::with(Delays {
            count: delay,
            ..Default::default()
        })
    }
}

impl RepositoryProvider for SlowRepositoryProvider {
    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn stations(&self) -> &dyn StationRepository {
        &self.stations
    }
}
