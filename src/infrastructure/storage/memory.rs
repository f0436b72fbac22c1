//! In-memory repository implementations

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::booking::{Booking, BookingFilter, BookingRepository, BookingStatus};
use crate::domain::station::{Station, StationFilter, StationRepository, StationStatus};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

/// Rows keep an insertion sequence so listings come back oldest first.
struct Row<T> {
    seq: u64,
    value: T,
}

fn sorted<T: Clone>(mut rows: Vec<(u64, T)>) -> Vec<T> {
    rows.sort_by_key(|(seq, _)| *seq);
    rows.into_iter().map(|(_, v)| v).collect()
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    rows: DashMap<String, Row<Booking>>,
    seq: AtomicU64,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(&self, keep: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        sorted(
            self.rows
                .iter()
                .filter(|e| keep(&e.value().value))
                .map(|e| (e.value().seq, e.value().value.clone()))
                .collect(),
        )
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn save(&self, booking: Booking) -> DomainResult<()> {
        if self.rows.contains_key(&booking.id) {
            return Err(DomainError::Conflict(format!(
                "Booking {} already exists",
                booking.id
            )));
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.rows.insert(
            booking.id.clone(),
            Row {
                seq,
                value: booking,
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        Ok(self.rows.get(id).map(|r| r.value.clone()))
    }

    async fn update(&self, booking: Booking) -> DomainResult<()> {
        match self.rows.get_mut(&booking.id) {
            Some(mut row) => {
                row.value = booking;
                Ok(())
            }
            None => Err(DomainError::not_found("Booking", booking.id)),
        }
    }

    async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut row = self
            .rows
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("Booking", id))?;
        let booking = &mut row.value;
        if booking.status != expected {
            return Err(DomainError::Conflict(format!(
                "booking {} is {}, expected {}",
                id, booking.status, expected
            )));
        }
        booking.status = next;
        booking.updated_at = at;
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        self.rows
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Booking", id))
    }

    async fn find(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        Ok(self.collect(|b| filter.matches(b)))
    }

    async fn find_overlapping(
        &self,
        station_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[BookingStatus],
        exclude_id: Option<&str>,
    ) -> DomainResult<Vec<Booking>> {
        Ok(self.collect(|b| {
            b.station_id == station_id
                && statuses.contains(&b.status)
                && exclude_id != Some(b.id.as_str())
                && b.overlaps(start, end)
        }))
    }

    async fn count_active_at(
        &self,
        station_id: &str,
        at: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> DomainResult<u64> {
        let count = self
            .rows
            .iter()
            .filter(|e| {
                let b = &e.value().value;
                b.station_id == station_id
                    && statuses.contains(&b.status)
                    && b.start_time <= at
                    && at <= b.end_time
            })
            .count();
        Ok(count as u64)
    }
}

#[derive(Default)]
pub struct InMemoryStationRepository {
    rows: DashMap<String, Row<Station>>,
    seq: AtomicU64,
}

impl InMemoryStationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify(&self, id: &str, change: impl FnOnce(&mut Station)) -> DomainResult<()> {
        let mut row = self
            .rows
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("Station", id))?;
        change(&mut row.value);
        Ok(())
    }
}

#[async_trait]
impl StationRepository for InMemoryStationRepository {
    async fn save(&self, station: Station) -> DomainResult<()> {
        if self.rows.contains_key(&station.id) {
            return Err(DomainError::Conflict(format!(
                "Station {} already exists",
                station.id
            )));
        }
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.rows.insert(
            station.id.clone(),
            Row {
                seq,
                value: station,
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Station>> {
        Ok(self.rows.get(id).map(|r| r.value.clone()))
    }

    async fn update(&self, station: Station) -> DomainResult<()> {
        match self.rows.get_mut(&station.id) {
            Some(mut row) => {
                row.value = station;
                Ok(())
            }
            None => Err(DomainError::not_found("Station", station.id)),
        }
    }

    async fn update_available_slots(
        &self,
        id: &str,
        available_slots: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.modify(id, |s| {
            s.available_slots = available_slots;
            s.updated_at = at;
        })
    }

    async fn update_capacity(
        &self,
        id: &str,
        total_slots: i32,
        available_slots: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.modify(id, |s| {
            s.total_slots = total_slots;
            s.available_slots = available_slots;
            s.updated_at = at;
        })
    }

    async fn update_status(&self, id: &str, status: StationStatus, at: DateTime<Utc>) -> DomainResult<()> {
        self.modify(id, |s| {
            s.status = status;
            s.updated_at = at;
        })
    }

    async fn find(&self, filter: &StationFilter) -> DomainResult<Vec<Station>> {
        Ok(sorted(
            self.rows
                .iter()
                .filter(|e| filter.matches(&e.value().value))
                .map(|e| (e.value().seq, e.value().value.clone()))
                .collect(),
        ))
    }
}

/// Repository provider backed by process memory.
#[derive(Default)]
pub struct InMemoryRepositoryProvider {
    bookings: InMemoryBookingRepository,
    stations: InMemoryStationRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }

    fn stations(&self) -> &dyn StationRepository {
        &self.stations
    }
}
