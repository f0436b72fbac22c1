//! Station capacity service
//!
//! Owns every write to station records: creation, partial updates,
//! status transitions and the derived `available_slots` count.
//!
//! Writes to one station are serialized on a per-station lock. Capacity
//! and status writes touch only their own columns.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::booking::BookingStatus;
use crate::domain::station::model::validate_total_slots;
use crate::domain::station::{
    haversine_km, NewStation, Station, StationChanges, StationFilter, StationStatus,
};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::shared::locks::KeyedLocks;
use crate::shared::time::{with_deadline, SharedClock};

pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 10.0;

/// A station together with its distance from a query point
#[derive(Debug, Clone)]
pub struct NearbyStation {
    pub station: Station,
    pub distance_km: f64,
}

pub struct StationCapacityReconciler {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    store_timeout: Duration,
    locks: KeyedLocks,
}

impl StationCapacityReconciler {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: SharedClock, store_timeout: Duration) -> Self {
        Self {
            repos,
            clock,
            store_timeout,
            locks: KeyedLocks::new(),
        }
    }

    async fn load(&self, id: &str) -> DomainResult<Station> {
        with_deadline(
            self.store_timeout,
            "stations.find_by_id",
            self.repos.stations().find_by_id(id),
        )
        .await?
        .ok_or_else(|| DomainError::not_found("Station", id))
    }


    // ── Capacity ────────────────────────────────────────────────

    /// Confirmed or in-progress bookings on the station whose interval contains `now`.
    pub async fn active_booking_count(&self, station_id: &str, now: DateTime<Utc>) -> DomainResult<u64> {
        with_deadline(
            self.store_timeout,
            "bookings.count_active_at",
            self.repos
                .bookings()
                .count_active_at(station_id, now, &BookingStatus::OCCUPYING),
        )
        .await
    }

    /// Recompute `available_slots` from the current read state.
    pub async fn reconcile(&self, station_id: &str) -> DomainResult<Station> {
        let _guard = self.locks.lock(station_id).await;
        let mut station = self.load(station_id).await?;
        let now = self.clock.now();
        let active = self.active_booking_count(station_id, now).await?;

        station.available_slots = Station::slots_left(station.total_slots, active);
        station.updated_at = now;
        with_deadline(
            self.store_timeout,
            "stations.update_available_slots",
            self.repos
                .stations()
                .update_available_slots(station_id, station.available_slots, now),
        )
        .await?;

        metrics::counter!("station_reconciliations_total").increment(1);
        debug!(
            station_id,
            total = station.total_slots,
            active,
            available = station.available_slots,
            "Station reconciled"
        );
        Ok(station)
    }

    /// Change the slot count (1..=50). The free-slot count is recomputed
    /// and written together with it.
    pub async fn update_capacity(&self, station_id: &str, total_slots: i32) -> DomainResult<Station> {
        validate_total_slots(total_slots)?;

        let _guard = self.locks.lock(station_id).await;
        let mut station = self.load(station_id).await?;
        let now = self.clock.now();
        let active = self.active_booking_count(station_id, now).await?;

        let previous = station.total_slots;
        station.total_slots = total_slots;
        station.available_slots = Station::slots_left(total_slots, active);
        station.updated_at = now;
        with_deadline(
            self.store_timeout,
            "stations.update_capacity",
            self.repos.stations().update_capacity(
                station_id,
                station.total_slots,
                station.available_slots,
                now,
            ),
        )
        .await?;

        info!(
            station_id,
            from = previous,
            to = total_slots,
            available = station.available_slots,
            "Station capacity changed"
        );
        Ok(station)
    }

    // ── Status ──────────────────────────────────────────────────

    pub async fn activate(&self, station_id: &str) -> DomainResult<Station> {
        self.set_status(station_id, StationStatus::Active).await
    }

    /// Refuses while any booking currently occupies a slot.
    pub async fn deactivate(&self, station_id: &str) -> DomainResult<Station> {
        self.set_status(station_id, StationStatus::Inactive).await
    }

    pub async fn set_maintenance(&self, station_id: &str) -> DomainResult<Station> {
        self.set_status(station_id, StationStatus::Maintenance).await
    }

    async fn set_status(&self, station_id: &str, status: StationStatus) -> DomainResult<Station> {
        let _guard = self.locks.lock(station_id).await;
        let mut station = self.load(station_id).await?;
        let now = self.clock.now();
        if status == StationStatus::Inactive {
            self.ensure_idle(station_id, now).await?;
        }

        let previous = station.status;
        with_deadline(
            self.store_timeout,
            "stations.update_status",
            self.repos.stations().update_status(station_id, status, now),
        )
        .await?;
        station.status = status;
        station.updated_at = now;

        info!(station_id, from = %previous, to = %status, "Station status changed");
        Ok(station)
    }

    async fn ensure_idle(&self, station_id: &str, now: DateTime<Utc>) -> DomainResult<()> {
        let active = self.active_booking_count(station_id, now).await?;
        if active > 0 {
            warn!(station_id, active, "Deactivation refused");
            return Err(DomainError::Conflict(format!(
                "active bookings exist ({})",
                active
            )));
        }
        Ok(())
    }

    // ── Station records ─────────────────────────────────────────

    pub async fn create_station(&self, draft: NewStation) -> DomainResult<Station> {
        draft.validate()?;
        let station = Station::new(draft, self.clock.now());
        with_deadline(
            self.store_timeout,
            "stations.save",
            self.repos.stations().save(station.clone()),
        )
        .await?;

        info!(
            station_id = %station.id,
            name = %station.name,
            total_slots = station.total_slots,
            "Station created"
        );
        Ok(station)
    }

    pub async fn get_station(&self, station_id: &str) -> DomainResult<Station> {
        self.load(station_id).await
    }

    pub async fn list_stations(&self, filter: &StationFilter) -> DomainResult<Vec<Station>> {
        with_deadline(
            self.store_timeout,
            "stations.find",
            self.repos.stations().find(filter),
        )
        .await
    }

    pub async fn list_by_operator(&self, operator_id: &str) -> DomainResult<Vec<Station>> {
        self.list_stations(&StationFilter {
            operator_id: Some(operator_id.to_string()),
            ..Default::default()
        })
        .await
    }

    /// Partial update. Slot and status changes obey the same rules as
    /// [`update_capacity`](Self::update_capacity) and
    /// [`deactivate`](Self::deactivate); nothing is written unless every
    /// change is valid.
    pub async fn update_station(&self, station_id: &str, changes: StationChanges) -> DomainResult<Station> {
        changes.validate()?;

        let _guard = self.locks.lock(station_id).await;
        let mut station = self.load(station_id).await?;
        let now = self.clock.now();

        if changes.status == Some(StationStatus::Inactive) && station.status != StationStatus::Inactive {
            self.ensure_idle(station_id, now).await?;
        }

        if let Some(name) = changes.name {
            station.name = name;
        }
        if let Some(location) = changes.location {
            station.location = location;
        }
        if let Some(station_type) = changes.station_type {
            station.station_type = station_type;
        }
        if let Some(hours) = changes.operating_hours {
            station.operating_hours = hours;
        }
        if let Some(operator_id) = changes.operator_id {
            station.operator_id = operator_id;
        }
        if let Some(status) = changes.status {
            station.status = status;
        }
        if let Some(total_slots) = changes.total_slots {
            let active = self.active_booking_count(station_id, now).await?;
            station.total_slots = total_slots;
            station.available_slots = Station::slots_left(total_slots, active);
        }
        station.updated_at = now;

        with_deadline(
            self.store_timeout,
            "stations.update",
            self.repos.stations().update(station.clone()),
        )
        .await?;
        info!(station_id, "Station updated");
        Ok(station)
    }

    // ── Search ──────────────────────────────────────────────────

    /// Active stations within `radius_km` of the point, nearest first.
    pub async fn get_nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> DomainResult<Vec<NearbyStation>> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::Validation(format!(
                "Coordinates out of range: ({}, {})",
                latitude, longitude
            )));
        }
        if !radius_km.is_finite() || radius_km < 0.0 {
            return Err(DomainError::Validation(
                "radius must be a non-negative number of kilometres".into(),
            ));
        }

        let active = self
            .list_stations(&StationFilter {
                status: Some(StationStatus::Active),
                ..Default::default()
            })
            .await?;

        let mut nearby: Vec<NearbyStation> = active
            .into_iter()
            .map(|station| {
                let distance_km = haversine_km(
                    latitude,
                    longitude,
                    station.location.latitude,
                    station.location.longitude,
                );
                NearbyStation {
                    station,
                    distance_km,
                }
            })
            .filter(|n| n.distance_km <= radius_km)
            .collect();
        nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(nearby)
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    use crate::application::services::BookingLifecycle;
    use crate::domain::booking::{BookingPolicy, NewBooking};
    use crate::domain::station::{Location, OperatingHours, StationType};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::infrastructure::storage::slow::SlowRepositoryProvider;
    use crate::shared::time::{Clock, ManualClock};

    struct Harness {
        stations: Arc<StationCapacityReconciler>,
        bookings: BookingLifecycle,
        clock: Arc<ManualClock>,
        now: DateTime<Utc>,
    }

    fn harness() -> Harness {
        harness_with(Arc::new(InMemoryRepositoryProvider::new()), Duration::from_secs(1))
    }

    fn harness_with(repos: Arc<dyn RepositoryProvider>, store_timeout: Duration) -> Harness {
        let now = Utc::now();
        let clock = Arc::new(ManualClock::new(now));
        Harness {
            stations: Arc::new(StationCapacityReconciler::new(
                repos.clone(),
                clock.clone(),
                store_timeout,
            )),
            bookings: BookingLifecycle::new(
                repos,
                clock.clone(),
                BookingPolicy::default(),
                Duration::from_secs(1),
            ),
            clock,
            now,
        }
    }

    fn draft_at(name: &str, total_slots: i32, latitude: f64, longitude: f64) -> NewStation {
        NewStation {
            name: name.into(),
            location: Location {
                address: "Main St".into(),
                city: "Colombo".into(),
                district: "Colombo".into(),
                latitude,
                longitude,
            },
            station_type: StationType::AC,
            total_slots,
            operating_hours: OperatingHours::default(),
            operator_id: "op-1".into(),
        }
    }

    fn draft(total_slots: i32) -> NewStation {
        draft_at("Fort", total_slots, 6.9271, 79.8612)
    }

    /// Book `[start, start + 1h)` and approve it.
    async fn confirmed_booking(h: &Harness, station_id: &str, start: DateTime<Utc>) -> String {
        let b = h
            .bookings
            .create(NewBooking {
                user_id: "owner".into(),
                station_id: station_id.into(),
                start_time: start,
                end_time: start + ChronoDuration::hours(1),
                vehicle_type: "Car".into(),
            })
            .await
            .unwrap();
        h.bookings.approve(&b.id).await.unwrap();
        b.id
    }

    #[tokio::test]
    async fn reconcile_with_no_bookings_frees_every_slot() {
        let h = harness();
        let s = h.stations.create_station(draft(5)).await.unwrap();
        let s = h.stations.reconcile(&s.id).await.unwrap();
        assert_eq!(s.available_slots, 5);
    }

    #[tokio::test]
    async fn future_confirmed_booking_does_not_occupy_a_slot_yet() {
        let h = harness();
        let s = h.stations.create_station(draft(5)).await.unwrap();
        confirmed_booking(&h, &s.id, h.now + ChronoDuration::days(2)).await;

        let reconciled = h.stations.reconcile(&s.id).await.unwrap();
        assert_eq!(reconciled.available_slots, 5);

        // once "now" falls inside the booking it counts
        h.clock
            .set(h.now + ChronoDuration::days(2) + ChronoDuration::minutes(30));
        let reconciled = h.stations.reconcile(&s.id).await.unwrap();
        assert_eq!(reconciled.available_slots, 4);
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let h = harness();
        let s = h.stations.create_station(draft(3)).await.unwrap();
        confirmed_booking(&h, &s.id, h.now + ChronoDuration::minutes(1)).await;
        h.clock.advance(ChronoDuration::minutes(10));

        let first = h.stations.reconcile(&s.id).await.unwrap();
        let second = h.stations.reconcile(&s.id).await.unwrap();
        assert_eq!(first.available_slots, 2);
        assert_eq!(first.available_slots, second.available_slots);
    }

    #[tokio::test]
    async fn pending_bookings_do_not_count_against_capacity() {
        let h = harness();
        let s = h.stations.create_station(draft(2)).await.unwrap();
        h.bookings
            .create(NewBooking {
                user_id: "owner".into(),
                station_id: s.id.clone(),
                start_time: h.now + ChronoDuration::minutes(1),
                end_time: h.now + ChronoDuration::hours(1),
                vehicle_type: "Car".into(),
            })
            .await
            .unwrap();
        h.clock.advance(ChronoDuration::minutes(5));
        assert_eq!(
            h.stations.active_booking_count(&s.id, h.clock.now()).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn shrinking_capacity_to_active_count_leaves_nothing_free() {
        let h = harness();
        let s = h.stations.create_station(draft(2)).await.unwrap();
        confirmed_booking(&h, &s.id, h.now + ChronoDuration::minutes(1)).await;
        h.clock.advance(ChronoDuration::minutes(5));
        let s = h.stations.update_capacity(&s.id, 1).await.unwrap();
        assert_eq!(s.total_slots, 1);
        assert_eq!(s.available_slots, 0);
    }

    #[tokio::test]
    async fn deactivate_refused_while_a_booking_is_active() {
        let h = harness();
        let s = h.stations.create_station(draft(4)).await.unwrap();
        let booking_id = confirmed_booking(&h, &s.id, h.now + ChronoDuration::minutes(1)).await;
        h.clock.advance(ChronoDuration::minutes(5));

        let err = h.stations.deactivate(&s.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref m) if m.contains("active bookings exist")));
        assert_eq!(
            h.stations.get_station(&s.id).await.unwrap().status,
            StationStatus::Active
        );

        h.bookings.complete(&booking_id).await.unwrap();
        let s = h.stations.deactivate(&s.id).await.unwrap();
        assert_eq!(s.status, StationStatus::Inactive);

        let s = h.stations.activate(&s.id).await.unwrap();
        assert_eq!(s.status, StationStatus::Active);
    }

    #[tokio::test]
    async fn update_capacity_bounds() {
        let h = harness();
        let s = h.stations.create_station(draft(5)).await.unwrap();
        for bad in [0, 51] {
            let err = h.stations.update_capacity(&s.id, bad).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{} -> {:?}", bad, err);
        }
        let s = h.stations.update_capacity(&s.id, 50).await.unwrap();
        assert_eq!(s.total_slots, 50);
        assert_eq!(s.available_slots, 50);
    }

    #[tokio::test]
    async fn unknown_station_is_not_found() {
        let h = harness();
        assert!(matches!(
            h.stations.reconcile("ghost").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            h.stations.deactivate("ghost").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            h.stations.activate("ghost").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            h.stations.update_capacity("ghost", 4).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_station_is_all_or_nothing() {
        let h = harness();
        let s = h.stations.create_station(draft(4)).await.unwrap();
        confirmed_booking(&h, &s.id, h.now + ChronoDuration::minutes(1)).await;
        h.clock.advance(ChronoDuration::minutes(5));

        let err = h
            .stations
            .update_station(
                &s.id,
                StationChanges {
                    name: Some("Renamed".into()),
                    status: Some(StationStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(h.stations.get_station(&s.id).await.unwrap().name, "Fort");

        let err = h
            .stations
            .update_station(
                &s.id,
                StationChanges {
                    name: Some("Renamed".into()),
                    total_slots: Some(99),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(h.stations.get_station(&s.id).await.unwrap().name, "Fort");

        let updated = h
            .stations
            .update_station(
                &s.id,
                StationChanges {
                    name: Some("Renamed".into()),
                    total_slots: Some(6),
                    station_type: Some(StationType::DC),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.station_type, StationType::DC);
        assert_eq!(updated.total_slots, 6);
        assert_eq!(updated.available_slots, 5);
    }

    #[tokio::test]
    async fn nearby_returns_active_stations_in_radius_nearest_first() {
        let h = harness();
        let fort = h
            .stations
            .create_station(draft_at("Fort", 2, 6.9271, 79.8612))
            .await
            .unwrap();
        let dehiwala = h
            .stations
            .create_station(draft_at("Dehiwala", 2, 6.8511, 79.8659))
            .await
            .unwrap();
        h.stations
            .create_station(draft_at("Kandy", 2, 7.2906, 80.6337))
            .await
            .unwrap();
        let closed = h
            .stations
            .create_station(draft_at("Closed", 2, 6.9275, 79.8615))
            .await
            .unwrap();
        h.stations.set_maintenance(&closed.id).await.unwrap();

        let found = h
            .stations
            .get_nearby(6.9271, 79.8612, DEFAULT_NEARBY_RADIUS_KM)
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|n| n.station.id.as_str()).collect();
        assert_eq!(ids, vec![fort.id.as_str(), dehiwala.id.as_str()]);
        assert!(found[1].distance_km > 8.0 && found[1].distance_km < 9.5);
    }

    #[tokio::test]
    async fn nearby_rejects_bad_query() {
        let h = harness();
        assert!(h.stations.get_nearby(95.0, 0.0, 10.0).await.is_err());
        assert!(h.stations.get_nearby(0.0, 0.0, -1.0).await.is_err());
    }

    #[tokio::test]
    async fn operator_listing() {
        let h = harness();
        h.stations.create_station(draft(2)).await.unwrap();
        let mut other = draft(2);
        other.operator_id = "op-2".into();
        h.stations.create_station(other).await.unwrap();

        let mine = h.stations.list_by_operator("op-1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].operator_id, "op-1");
    }

    #[tokio::test]
    async fn reconcile_racing_deactivate_keeps_station_inactive() {
        let h = harness_with(
            Arc::new(SlowRepositoryProvider::slow_reads(Duration::from_millis(200))),
            Duration::from_secs(1),
        );
        let s = h.stations.create_station(draft(3)).await.unwrap();

        let reconcile = {
            let stations = h.stations.clone();
            let id = s.id.clone();
            tokio::spawn(async move { stations.reconcile(&id).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        h.stations.deactivate(&s.id).await.unwrap();
        reconcile.await.unwrap().unwrap();

        let stored = h.stations.get_station(&s.id).await.unwrap();
        assert_eq!(stored.status, StationStatus::Inactive);
        assert_eq!(stored.available_slots, 3);
    }

    #[tokio::test]
    async fn reconcile_racing_capacity_change_agrees_with_new_total() {
        let h = harness_with(
            Arc::new(SlowRepositoryProvider::slow_reads(Duration::from_millis(100))),
            Duration::from_secs(1),
        );
        let s = h.stations.create_station(draft(5)).await.unwrap();

        let (reconciled, resized) =
            tokio::join!(h.stations.reconcile(&s.id), h.stations.update_capacity(&s.id, 2));
        reconciled.unwrap();
        resized.unwrap();

        let stored = h.stations.get_station(&s.id).await.unwrap();
        assert_eq!((stored.total_slots, stored.available_slots), (2, 2));
    }

    #[tokio::test]
    async fn failed_capacity_change_writes_nothing() {
        let h = harness_with(
            Arc::new(SlowRepositoryProvider::slow_counts(Duration::from_millis(200))),
            Duration::from_millis(50),
        );
        let s = h.stations.create_station(draft(5)).await.unwrap();

        let err = h.stations.update_capacity(&s.id, 2).await.unwrap_err();
        assert!(matches!(err, DomainError::Timeout(_)), "{:?}", err);

        let stored = h.stations.get_station(&s.id).await.unwrap();
        assert_eq!((stored.total_slots, stored.available_slots), (5, 5));
        assert_eq!(stored.updated_at, s.updated_at);
    }

    #[tokio::test]
    async fn status_change_keeps_slot_counts() {
        let h = harness();
        let s = h.stations.create_station(draft(4)).await.unwrap();
        h.stations.update_capacity(&s.id, 6).await.unwrap();
        h.clock.advance(ChronoDuration::minutes(1));

        let s = h.stations.set_maintenance(&s.id).await.unwrap();
        assert_eq!(s.status, StationStatus::Maintenance);
        assert_eq!(s.updated_at, h.clock.now());

        let stored = h.stations.get_station(&s.id).await.unwrap();
        assert_eq!(stored, s);
        assert_eq!((stored.total_slots, stored.available_slots), (6, 6));
    }
}
