//! Booking domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Booking status
///
/// Allowed transitions:
///
/// | from        | to                                  |
/// |-------------|-------------------------------------|
/// | Pending     | Confirmed, Cancelled, Completed     |
/// | Confirmed   | InProgress, Cancelled, Completed    |
/// | InProgress  | Completed                           |
/// | Cancelled   | (terminal)                          |
/// | Completed   | (terminal)                          |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Created, awaiting operator approval
    Pending,
    /// Approved by the station operator
    Confirmed,
    /// Vehicle is charging
    InProgress,
    /// Cancelled by the owner before the lock window
    Cancelled,
    /// Charging session finished
    Completed,
}

impl BookingStatus {
    /// Statuses that hold a time slot and block overlapping bookings.
    pub const SLOT_HOLDING: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
    ];

    /// Statuses that occupy a physical charging slot for capacity counting.
    pub const OCCUPYING: [BookingStatus; 2] = [BookingStatus::Confirmed, BookingStatus::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::InProgress => "InProgress",
            Self::Cancelled => "Cancelled",
            Self::Completed => "Completed",
        }
    }

    /// Parse a stored status; accepts the legacy lowercase / kebab forms.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" | "pending" => Some(Self::Pending),
            "Confirmed" | "confirmed" => Some(Self::Confirmed),
            "InProgress" | "in-progress" => Some(Self::InProgress),
            "Cancelled" | "cancelled" => Some(Self::Cancelled),
            "Completed" | "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Pending, Completed)
                | (Confirmed, Confirmed)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
                | (InProgress, Completed)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reservation of charging time at a station
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub station_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub vehicle_type: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Build a new pending booking with a fresh id, stamped at `now`.
    pub fn new(draft: NewBooking, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: draft.user_id,
            station_id: draft.station_id,
            start_time: draft.start_time,
            end_time: draft.end_time,
            vehicle_type: draft.vehicle_type,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Half-open interval overlap: `[start, end)` against `[self.start, self.end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time
    }

    /// Whether this booking occupies a slot at `at`.
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        BookingStatus::OCCUPYING.contains(&self.status)
            && self.start_time <= at
            && at <= self.end_time
    }

    /// Apply the changed fields. Id, creation time and status stay as they were.
    pub fn apply(&mut self, changes: &BookingChanges, now: DateTime<Utc>) {
        if let Some(user_id) = &changes.user_id {
            self.user_id = user_id.clone();
        }
        if let Some(station_id) = &changes.station_id {
            self.station_id = station_id.clone();
        }
        if let Some(start) = changes.start_time {
            self.start_time = start;
        }
        if let Some(end) = changes.end_time {
            self.end_time = end;
        }
        if let Some(vehicle_type) = &changes.vehicle_type {
            self.vehicle_type = vehicle_type.clone();
        }
        self.updated_at = now;
    }
}

/// Caller-supplied fields for a new booking
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub station_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub vehicle_type: String,
}

/// Partial update of a booking; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct BookingChanges {
    pub user_id: Option<String>,
    pub station_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub vehicle_type: Option<String>,
}

/// Equality filters for listing bookings
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub user_id: Option<String>,
    pub station_id: Option<String>,
}

impl BookingFilter {
    pub fn matches(&self, b: &Booking) -> bool {
        self.user_id.as_ref().map_or(true, |u| &b.user_id == u)
            && self.station_id.as_ref().map_or(true, |s| &b.station_id == s)
    }
}

/// Per-user booking counts for the owner's overview
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserBookingStats {
    /// Awaiting operator approval
    pub pending: u64,
    /// Confirmed and starting after `now`
    pub upcoming_confirmed: u64,
    /// Started before `now`, whatever the status
    pub past: u64,
}

impl UserBookingStats {
    pub fn tally<'a>(bookings: impl IntoIterator<Item = &'a Booking>, now: DateTime<Utc>) -> Self {
        let mut stats = Self::default();
        for b in bookings {
            if b.status == BookingStatus::Pending {
                stats.pending += 1;
            }
            if b.status == BookingStatus::Confirmed && b.start_time > now {
                stats.upcoming_confirmed += 1;
            }
            if b.start_time < now {
                stats.past += 1;
            }
        }
        stats
    }
}

// ── Tests ──────────────────────────────────────────────────────
