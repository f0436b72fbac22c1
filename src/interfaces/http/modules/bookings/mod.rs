//! `/api/v1/bookings`

pub mod dto;
pub mod handlers;

pub use handlers::BookingAppState;
