//! Domain layer: booking and station aggregates, repository traits.

pub mod booking;
pub mod repositories;
pub mod station;

pub use booking::{Booking, BookingChanges, BookingFilter, BookingStatus, NewBooking};
pub use repositories::{DomainResult, RepositoryProvider};
pub use station::{
    Location, NewStation, OperatingHours, Station, StationChanges, StationFilter, StationStatus,
    StationType,
};

pub use crate::shared::errors::DomainError;
