//! Time-window rules for bookings

use chrono::{DateTime, Duration, Utc};

use crate::shared::errors::DomainError;

/// How far ahead a booking may start, and how close to its start it
/// becomes frozen.
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    /// `start_time` must lie within `[now, now + advance_window]`.
    pub advance_window: Duration,
    /// No edits or cancellation once `start_time - now < lock_window`.
    pub lock_window: Duration,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            advance_window: Duration::days(7),
            lock_window: Duration::hours(12),
        }
    }
}

impl BookingPolicy {
    pub fn ensure_bookable(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_within_advance_window(start, now)?;
        ensure_ordered(start, end)
    }

    pub fn ensure_within_advance_window(
        &self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if start < now || start > now + self.advance_window {
            return Err(DomainError::Validation(format!(
                "out of window: start time must be between now and {} days ahead",
                self.advance_window.num_days()
            )));
        }
        Ok(())
    }

    pub fn ensure_unlocked(
        &self,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if start - now < self.lock_window {
            return Err(DomainError::LockWindow(format!(
                "booking cannot be changed within {} hours of its start time",
                self.lock_window.num_hours()
            )));
        }
        Ok(())
    }
}

pub fn ensure_ordered(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), DomainError> {
    if end <= start {
        return Err(DomainError::Validation(
            "end time must be after start time".into(),
        ));
    }
    Ok(())
}
