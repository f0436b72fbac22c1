//! Booking DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::booking::{Booking, BookingChanges, BookingFilter, NewBooking, UserBookingStats};

/// Request to create a booking
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[validate(length(min = 1, max = 64))]
    pub station_id: String,
    /// RFC 3339 timestamp
    pub start_time: DateTime<Utc>,
    /// RFC 3339 timestamp, strictly after `startTime`
    pub end_time: DateTime<Utc>,
    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: String,
}

impl From<CreateBookingRequest> for NewBooking {
    fn from(r: CreateBookingRequest) -> Self {
        NewBooking {
            user_id: r.user_id,
            station_id: r.station_id,
            start_time: r.start_time,
            end_time: r.end_time,
            vehicle_type: r.vehicle_type,
        }
    }
}

/// Partial booking update; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    #[validate(length(min = 1, max = 64))]
    pub user_id: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub station_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 50))]
    pub vehicle_type: Option<String>,
}

impl From<UpdateBookingRequest> for BookingChanges {
    fn from(r: UpdateBookingRequest) -> Self {
        BookingChanges {
            user_id: r.user_id,
            station_id: r.station_id,
            start_time: r.start_time,
            end_time: r.end_time,
            vehicle_type: r.vehicle_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreatedResponse {
    pub booking_id: String,
}

/// Booking details in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    pub id: String,
    pub user_id: String,
    pub station_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub vehicle_type: String,
    /// Pending, Confirmed, InProgress, Cancelled, Completed
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            station_id: b.station_id,
            start_time: b.start_time,
            end_time: b.end_time,
            vehicle_type: b.vehicle_type,
            status: b.status.as_str().to_string(),
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookingListQuery {
    #[validate(length(max = 64))]
    pub user_id: Option<String>,
    #[validate(length(max = 64))]
    pub station_id: Option<String>,
}

impl From<BookingListQuery> for BookingFilter {
    fn from(q: BookingListQuery) -> Self {
        BookingFilter {
            user_id: q.user_id.filter(|s| !s.is_empty()),
            station_id: q.station_id.filter(|s| !s.is_empty()),
        }
    }
}

/// Dashboard counters for one EV owner
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserBookingStatsDto {
    /// Bookings still waiting for approval
    pub pending_reservations: u64,
    /// Confirmed bookings that have not started yet
    pub approved_reservations: u64,
    /// Bookings whose start time has passed
    pub past_bookings: u64,
}

impl From<UserBookingStats> for UserBookingStatsDto {
    fn from(s: UserBookingStats) -> Self {
        Self {
            pending_reservations: s.pending,
            approved_reservations: s.upcoming_confirmed,
            past_bookings: s.past,
        }
    }
}
