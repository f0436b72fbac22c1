//! Booking lifecycle service
//!
//! Every booking mutation goes through here. The service enforces the
//! advance window, the lock window, the status transition table and the
//! one-booking-per-interval rule per station.
//!
//! Mutations hold the lock of the booking's station from the first read
//! to the final write, so two writers on one booking or one schedule never
//! interleave. A booking that moves holds both stations' locks.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::booking::policy::ensure_ordered;
use crate::domain::booking::{
    Booking, BookingChanges, BookingFilter, BookingPolicy, BookingStatus, NewBooking,
    UserBookingStats,
};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};
use crate::shared::locks::{KeyedGuard, KeyedLocks};
use crate::shared::time::{with_deadline, SharedClock};

pub struct BookingLifecycle {
    repos: Arc<dyn RepositoryProvider>,
    clock: SharedClock,
    policy: BookingPolicy,
    store_timeout: Duration,
    station_locks: KeyedLocks,
}

impl BookingLifecycle {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        clock: SharedClock,
        policy: BookingPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            repos,
            clock,
            policy,
            store_timeout,
            station_locks: KeyedLocks::new(),
        }
    }

    async fn load(&self, id: &str) -> DomainResult<Booking> {
        with_deadline(
            self.store_timeout,
            "bookings.find_by_id",
            self.repos.bookings().find_by_id(id),
        )
        .await?
        .ok_or_else(|| DomainError::not_found("Booking", id))
    }

    /// Load a booking with its station locked. Reloads if the booking was
    /// moved to another station while we waited.
    async fn load_locked(&self, id: &str) -> DomainResult<(Booking, KeyedGuard<'_>)> {
        let mut station_id = self.load(id).await?.station_id;
        loop {
            let guard = self.station_locks.lock(&station_id).await;
            let booking = self.load(id).await?;
            if booking.station_id == station_id {
                return Ok((booking, guard));
            }
            station_id = booking.station_id;
        }
    }

    async fn ensure_slot_free(&self, booking: &Booking, exclude_self: bool) -> DomainResult<()> {
        let exclude = exclude_self.then_some(booking.id.as_str());
        let clashes = with_deadline(
            self.store_timeout,
            "bookings.find_overlapping",
            self.repos.bookings().find_overlapping(
                &booking.station_id,
                booking.start_time,
                booking.end_time,
                &BookingStatus::SLOT_HOLDING,
                exclude,
            ),
        )
        .await?;

        if let Some(clash) = clashes.first() {
            warn!(
                station_id = %booking.station_id,
                clashing_booking = %clash.id,
                "Rejected overlapping booking"
            );
            return Err(DomainError::Conflict("slot unavailable".into()));
        }
        Ok(())
    }

    fn reject(op: &'static str, err: DomainError) -> DomainError {
        metrics::counter!("booking_rejections_total", "operation" => op, "kind" => err.kind())
            .increment(1);
        err
    }

    /// Create a pending booking.
    pub async fn create(&self, draft: NewBooking) -> DomainResult<Booking> {
        self.try_create(draft)
            .await
            .map_err(|e| Self::reject("create", e))
    }

    async fn try_create(&self, draft: NewBooking) -> DomainResult<Booking> {
        if draft.user_id.trim().is_empty() || draft.station_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "userId and stationId are required".into(),
            ));
        }
        let now = self.clock.now();
        self.policy
            .ensure_bookable(draft.start_time, draft.end_time, now)?;

        let _guard = self.station_locks.lock(&draft.station_id).await;

        let booking = Booking::new(draft, now);
        self.ensure_slot_free(&booking, false).await?;

        with_deadline(
            self.store_timeout,
            "bookings.save",
            self.repos.bookings().save(booking.clone()),
        )
        .await?;

        metrics::counter!("bookings_created_total").increment(1);
        info!(
            booking_id = %booking.id,
            station_id = %booking.station_id,
            user_id = %booking.user_id,
            start = %booking.start_time,
            end = %booking.end_time,
            "Booking created"
        );
        Ok(booking)
    }

    /// Overwrite the given fields of a booking outside its lock window.
    pub async fn update(&self, id: &str, changes: BookingChanges) -> DomainResult<Booking> {
        self.try_update(id, &changes)
            .await
            .map_err(|e| Self::reject("update", e))
    }

    async fn try_update(&self, id: &str, changes: &BookingChanges) -> DomainResult<Booking> {
        let mut station_id = self.load(id).await?.station_id;
        loop {
            let mut keys = vec![station_id.as_str()];
            if let Some(target) = changes.station_id.as_deref() {
                keys.push(target);
            }
            let _guards = self.station_locks.lock_all(&keys).await;

            let existing = self.load(id).await?;
            if existing.station_id != station_id {
                station_id = existing.station_id;
                continue;
            }
            return self.apply_update(existing, changes).await;
        }
    }

    /// Caller holds the locks of the old and new station.
    async fn apply_update(&self, existing: Booking, changes: &BookingChanges) -> DomainResult<Booking> {
        if existing.status.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "booking {} is {} and can no longer change",
                existing.id, existing.status
            )));
        }

        let now = self.clock.now();
        self.policy.ensure_unlocked(existing.start_time, now)?;

        let mut updated = existing.clone();
        updated.apply(changes, now);

        if updated.user_id.trim().is_empty() || updated.station_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "userId and stationId are required".into(),
            ));
        }
        if updated.start_time != existing.start_time {
            self.policy
                .ensure_within_advance_window(updated.start_time, now)?;
        }
        ensure_ordered(updated.start_time, updated.end_time)?;

        let moved = updated.station_id != existing.station_id
            || updated.start_time != existing.start_time
            || updated.end_time != existing.end_time;
        if moved {
            self.ensure_slot_free(&updated, true).await?;
        }

        with_deadline(
            self.store_timeout,
            "bookings.update",
            self.repos.bookings().update(updated.clone()),
        )
        .await?;

        info!(booking_id = %updated.id, moved, "Booking updated");
        Ok(updated)
    }

    async fn transition(
        &self,
        op: &'static str,
        id: &str,
        next: BookingStatus,
    ) -> DomainResult<Booking> {
        let result: DomainResult<Booking> = async {
            let (mut booking, _guard) = self.load_locked(id).await?;
            if !booking.status.can_transition_to(next) {
                return Err(DomainError::Conflict(format!(
                    "booking {} cannot move from {} to {}",
                    id, booking.status, next
                )));
            }

            let now = self.clock.now();
            if next == BookingStatus::Cancelled {
                self.policy.ensure_unlocked(booking.start_time, now)?;
            }

            let previous = booking.status;
            with_deadline(
                self.store_timeout,
                "bookings.update_status",
                self.repos.bookings().update_status(id, previous, next, now),
            )
            .await?;
            booking.status = next;
            booking.updated_at = now;

            info!(booking_id = %id, from = %previous, to = %next, "Booking status changed");
            Ok(booking)
        }
        .await;

        result.map_err(|e| Self::reject(op, e))
    }

    /// Cancel a booking outside its lock window.
    pub async fn cancel(&self, id: &str) -> DomainResult<Booking> {
        self.transition("cancel", id, BookingStatus::Cancelled).await
    }

    /// Operator approval. No time-window restriction.
    pub async fn approve(&self, id: &str) -> DomainResult<Booking> {
        self.transition("approve", id, BookingStatus::Confirmed).await
    }

    /// Vehicle plugged in on a confirmed booking.
    pub async fn start(&self, id: &str) -> DomainResult<Booking> {
        self.transition("start", id, BookingStatus::InProgress).await
    }

    /// Charging finished. No time-window restriction.
    pub async fn complete(&self, id: &str) -> DomainResult<Booking> {
        self.transition("complete", id, BookingStatus::Completed).await
    }

    /// Hard delete, allowed only outside the lock window. Returns the
    /// removed record.
    pub async fn delete(&self, id: &str) -> DomainResult<Booking> {
        let result: DomainResult<Booking> = async {
            let (booking, _guard) = self.load_locked(id).await?;
            self.policy.ensure_unlocked(booking.start_time, self.clock.now())?;
            with_deadline(
                self.store_timeout,
                "bookings.delete",
                self.repos.bookings().delete(id),
            )
            .await?;
            info!(booking_id = %id, station_id = %booking.station_id, "Booking deleted");
            Ok(booking)
        }
        .await;

        result.map_err(|e| Self::reject("delete", e))
    }

    pub async fn get(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        with_deadline(
            self.store_timeout,
            "bookings.find",
            self.repos.bookings().find(filter),
        )
        .await
    }

    pub async fn get_by_id(&self, id: &str) -> DomainResult<Booking> {
        self.load(id).await
    }

    /// Pending, upcoming confirmed and past booking counts for one owner.
    pub async fn user_stats(&self, user_id: &str) -> DomainResult<UserBookingStats> {
        let bookings = self
            .get(&BookingFilter {
                user_id: Some(user_id.to_string()),
                ..Default::default()
            })
            .await?;
        Ok(UserBookingStats::tally(&bookings, self.clock.now()))
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};

    use crate::infrastructure::storage::slow::SlowRepositoryProvider;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use crate::shared::time::ManualClock;

    struct Harness {
        lifecycle: Arc<BookingLifecycle>,
        clock: Arc<ManualClock>,
        now: DateTime<Utc>,
    }

    fn harness() -> Harness {
        harness_with(Arc::new(InMemoryRepositoryProvider::new()))
    }

    fn harness_with(repos: Arc<dyn RepositoryProvider>) -> Harness {
        let now = Utc::now();
        let clock = Arc::new(ManualClock::new(now));
        let lifecycle = Arc::new(BookingLifecycle::new(
            repos,
            clock.clone(),
            BookingPolicy::default(),
            Duration::from_secs(1),
        ));
        Harness {
            lifecycle,
            clock,
            now,
        }
    }

    fn draft(station: &str, start: DateTime<Utc>, hours: i64) -> NewBooking {
        NewBooking {
            user_id: "owner-1".into(),
            station_id: station.into(),
            start_time: start,
            end_time: start + ChronoDuration::hours(hours),
            vehicle_type: "Car".into(),
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_pending_booking() {
        let h = harness();
        let b = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::days(1), 1))
            .await
            .unwrap();

        let listed = h
            .lifecycle
            .get(&BookingFilter {
                station_id: Some("st-1".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, b.id);
        assert_eq!(listed[0].status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn create_outside_advance_window_is_rejected() {
        let h = harness();
        for start in [
            h.now - ChronoDuration::minutes(1),
            h.now + ChronoDuration::days(8),
        ] {
            let err = h.lifecycle.create(draft("st-1", start, 1)).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{:?}", err);
            assert!(err.to_string().contains("out of window"));
        }
    }

    #[tokio::test]
    async fn create_requires_end_after_start() {
        let h = harness();
        let mut d = draft("st-1", h.now + ChronoDuration::days(1), 1);
        d.end_time = d.start_time;
        let err = h.lifecycle.create(d).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn identical_slot_on_confirmed_booking_conflicts() {
        let h = harness();
        let start = h.now + ChronoDuration::days(2);
        let first = h.lifecycle.create(draft("st-1", start, 1)).await.unwrap();
        h.lifecycle.approve(&first.id).await.unwrap();

        let err = h.lifecycle.create(draft("st-1", start, 1)).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref m) if m == "slot unavailable"));
    }

    #[tokio::test]
    async fn partial_overlap_conflicts_but_adjacent_and_other_station_do_not() {
        let h = harness();
        let start = h.now + ChronoDuration::days(2);
        h.lifecycle.create(draft("st-1", start, 2)).await.unwrap();

        let overlap = h
            .lifecycle
            .create(draft("st-1", start + ChronoDuration::hours(1), 2))
            .await;
        assert!(matches!(overlap, Err(DomainError::Conflict(_))));

        h.lifecycle
            .create(draft("st-1", start + ChronoDuration::hours(2), 1))
            .await
            .expect("back-to-back booking is fine");
        h.lifecycle
            .create(draft("st-2", start, 2))
            .await
            .expect("different station is fine");
    }

    #[tokio::test]
    async fn cancelled_booking_frees_its_slot() {
        let h = harness();
        let start = h.now + ChronoDuration::days(3);
        let b = h.lifecycle.create(draft("st-1", start, 1)).await.unwrap();
        h.lifecycle.cancel(&b.id).await.unwrap();
        h.lifecycle.create(draft("st-1", start, 1)).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_creates_for_same_slot_admit_exactly_one() {
        let h = harness();
        let start = h.now + ChronoDuration::days(1);
        let mut tasks = Vec::new();
        for _ in 0..16 {
            let lifecycle = h.lifecycle.clone();
            let d = draft("st-1", start, 1);
            tasks.push(tokio::spawn(async move { lifecycle.create(d).await }));
        }
        let mut ok = 0;
        for t in tasks {
            if t.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn update_inside_lock_window_is_rejected() {
        let h = harness();
        let b = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::hours(10), 1))
            .await
            .unwrap();
        let err = h
            .lifecycle
            .update(
                &b.id,
                BookingChanges {
                    vehicle_type: Some("Van".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::LockWindow(_)));

        let cancel = h.lifecycle.cancel(&b.id).await.unwrap_err();
        assert!(matches!(cancel, DomainError::LockWindow(_)));
    }

    #[tokio::test]
    async fn update_outside_lock_window_succeeds_and_keeps_identity() {
        let h = harness();
        let b = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::hours(20), 1))
            .await
            .unwrap();
        h.clock.advance(ChronoDuration::minutes(5));

        let new_start = h.now + ChronoDuration::days(2);
        let updated = h
            .lifecycle
            .update(
                &b.id,
                BookingChanges {
                    start_time: Some(new_start),
                    end_time: Some(new_start + ChronoDuration::hours(2)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.id, b.id);
        assert_eq!(updated.created_at, b.created_at);
        assert_eq!(updated.start_time, new_start);
        assert_eq!(updated.updated_at, h.now + ChronoDuration::minutes(5));
        assert_eq!(h.lifecycle.get_by_id(&b.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn update_moving_onto_taken_slot_conflicts_and_leaves_record_untouched() {
        let h = harness();
        let a_start = h.now + ChronoDuration::days(2);
        let b_start = h.now + ChronoDuration::days(3);
        h.lifecycle.create(draft("st-1", a_start, 1)).await.unwrap();
        let b = h.lifecycle.create(draft("st-1", b_start, 1)).await.unwrap();

        let err = h
            .lifecycle
            .update(
                &b.id,
                BookingChanges {
                    start_time: Some(a_start),
                    end_time: Some(a_start + ChronoDuration::hours(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(h.lifecycle.get_by_id(&b.id).await.unwrap(), b);
    }

    #[tokio::test]
    async fn update_may_keep_its_own_slot() {
        let h = harness();
        let start = h.now + ChronoDuration::days(2);
        let b = h.lifecycle.create(draft("st-1", start, 2)).await.unwrap();
        h.lifecycle
            .update(
                &b.id,
                BookingChanges {
                    end_time: Some(start + ChronoDuration::hours(3)),
                    ..Default::default()
                },
            )
            .await
            .expect("overlapping only itself");
    }

    #[tokio::test]
    async fn update_revalidates_advance_window_against_current_time() {
        let h = harness();
        let b = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::days(6), 1))
            .await
            .unwrap();
        let err = h
            .lifecycle
            .update(
                &b.id,
                BookingChanges {
                    start_time: Some(h.now + ChronoDuration::days(9)),
                    end_time: Some(h.now + ChronoDuration::days(9) + ChronoDuration::hours(1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_booking_is_not_found_for_every_operation() {
        let h = harness();
        let l = &h.lifecycle;
        assert!(matches!(
            l.update("nope", BookingChanges::default()).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(l.cancel("nope").await, Err(DomainError::NotFound { .. })));
        assert!(matches!(l.approve("nope").await, Err(DomainError::NotFound { .. })));
        assert!(matches!(l.complete("nope").await, Err(DomainError::NotFound { .. })));
        assert!(matches!(l.delete("nope").await, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn approve_and_complete_ignore_time_windows() {
        let h = harness();
        let b = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::hours(1), 1))
            .await
            .unwrap();
        let b = h.lifecycle.approve(&b.id).await.unwrap();
        assert_eq!(b.status, BookingStatus::Confirmed);
        let b = h.lifecycle.start(&b.id).await.unwrap();
        assert_eq!(b.status, BookingStatus::InProgress);
        let b = h.lifecycle.complete(&b.id).await.unwrap();
        assert_eq!(b.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn terminal_bookings_are_frozen() {
        let h = harness();
        let b = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::days(2), 1))
            .await
            .unwrap();
        h.lifecycle.cancel(&b.id).await.unwrap();

        assert!(matches!(
            h.lifecycle
                .update(
                    &b.id,
                    BookingChanges {
                        vehicle_type: Some("Bike".into()),
                        ..Default::default()
                    }
                )
                .await,
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(h.lifecycle.approve(&b.id).await, Err(DomainError::Conflict(_))));
        assert!(matches!(h.lifecycle.complete(&b.id).await, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn delete_respects_lock_window() {
        let h = harness();
        let soon = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::hours(2), 1))
            .await
            .unwrap();
        assert!(matches!(
            h.lifecycle.delete(&soon.id).await,
            Err(DomainError::LockWindow(_))
        ));

        let later = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::days(2), 1))
            .await
            .unwrap();
        h.lifecycle.delete(&later.id).await.unwrap();
        assert!(matches!(
            h.lifecycle.get_by_id(&later.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn lock_window_follows_the_clock() {
        let h = harness();
        let b = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::hours(30), 1))
            .await
            .unwrap();
        h.clock.advance(ChronoDuration::hours(20));
        assert!(matches!(
            h.lifecycle.cancel(&b.id).await,
            Err(DomainError::LockWindow(_))
        ));
    }

    #[tokio::test]
    async fn cancel_racing_an_update_stays_cancelled() {
        let h = harness_with(Arc::new(SlowRepositoryProvider::slow_reads(
            std::time::Duration::from_millis(200),
        )));
        let start = h.now + ChronoDuration::days(2);
        let b = h.lifecycle.create(draft("st-1", start, 1)).await.unwrap();

        let update = {
            let lifecycle = h.lifecycle.clone();
            let id = b.id.clone();
            tokio::spawn(async move {
                lifecycle
                    .update(
                        &id,
                        BookingChanges {
                            vehicle_type: Some("Van".into()),
                            ..Default::default()
                        },
                    )
                    .await
            })
        };
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        h.lifecycle.cancel(&b.id).await.unwrap();
        let _ = update.await.unwrap();
        h.lifecycle
            .create(draft("st-1", start, 1))
            .await
            .expect("cancelled slot is free again");

        assert_eq!(
            h.lifecycle.get_by_id(&b.id).await.unwrap().status,
            BookingStatus::Cancelled
        );
        let holding: Vec<Booking> = h
            .lifecycle
            .get(&BookingFilter {
                station_id: Some("st-1".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .into_iter()
            .filter(|x| BookingStatus::SLOT_HOLDING.contains(&x.status))
            .collect();
        assert_eq!(holding.len(), 1);
    }

    #[tokio::test]
    async fn approve_racing_a_cancel_never_revives_it() {
        let h = harness_with(Arc::new(SlowRepositoryProvider::slow_reads(
            std::time::Duration::from_millis(100),
        )));
        let b = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::days(2), 1))
            .await
            .unwrap();

        let (cancel, approve) = tokio::join!(h.lifecycle.cancel(&b.id), h.lifecycle.approve(&b.id));
        let final_status = h.lifecycle.get_by_id(&b.id).await.unwrap().status;
        match (cancel, approve) {
            // approve then cancel
            (Ok(_), Ok(_)) => assert_eq!(final_status, BookingStatus::Cancelled),
            // cancel won; approve saw the terminal state
            (Ok(_), Err(DomainError::Conflict(_))) => {
                assert_eq!(final_status, BookingStatus::Cancelled)
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn station_locks_do_not_accumulate() {
        let h = harness();
        for i in 0..20 {
            let _ = h
                .lifecycle
                .create(draft(&format!("ghost-{}", i), h.now + ChronoDuration::days(30), 1))
                .await;
        }
        assert_eq!(h.lifecycle.station_locks.len(), 0);

        let b = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::days(2), 1))
            .await
            .unwrap();
        h.lifecycle
            .update(
                &b.id,
                BookingChanges {
                    station_id: Some("st-2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        h.lifecycle.cancel(&b.id).await.unwrap();
        assert_eq!(h.lifecycle.station_locks.len(), 0);
    }

    #[tokio::test]
    async fn opposite_moves_between_two_stations_finish() {
        let h = harness();
        let start = h.now + ChronoDuration::days(2);
        let a = h.lifecycle.create(draft("st-a", start, 1)).await.unwrap();
        let b = h
            .lifecycle
            .create(draft("st-b", start + ChronoDuration::hours(3), 1))
            .await
            .unwrap();

        let to_b = BookingChanges {
            station_id: Some("st-b".into()),
            ..Default::default()
        };
        let to_a = BookingChanges {
            station_id: Some("st-a".into()),
            ..Default::default()
        };
        let (ra, rb) = tokio::time::timeout(std::time::Duration::from_secs(5), async {
            tokio::join!(h.lifecycle.update(&a.id, to_b), h.lifecycle.update(&b.id, to_a))
        })
        .await
        .expect("no deadlock");
        assert_eq!(ra.unwrap().station_id, "st-b");
        assert_eq!(rb.unwrap().station_id, "st-a");
    }

    #[tokio::test]
    async fn user_stats_follow_the_clock() {
        let h = harness();
        let soon = h
            .lifecycle
            .create(draft("st-1", h.now + ChronoDuration::hours(1), 1))
            .await
            .unwrap();
        h.lifecycle.approve(&soon.id).await.unwrap();
        h.lifecycle
            .create(draft("st-1", h.now + ChronoDuration::days(2), 1))
            .await
            .unwrap();
        let mut other = draft("st-1", h.now + ChronoDuration::days(3), 1);
        other.user_id = "owner-2".into();
        h.lifecycle.create(other).await.unwrap();

        let stats = h.lifecycle.user_stats("owner-1").await.unwrap();
        assert_eq!(
            (stats.pending, stats.upcoming_confirmed, stats.past),
            (1, 1, 0)
        );

        h.clock.advance(ChronoDuration::hours(2));
        let stats = h.lifecycle.user_stats("owner-1").await.unwrap();
        assert_eq!(
            (stats.pending, stats.upcoming_confirmed, stats.past),
            (1, 0, 1)
        );
        assert_eq!(
            h.lifecycle.user_stats("nobody").await.unwrap(),
            UserBookingStats::default()
        );
    }
}
