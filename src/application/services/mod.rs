//! Application services

mod booking_lifecycle;
mod station_capacity;

pub use booking_lifecycle::BookingLifecycle;
pub use station_capacity::{NearbyStation, StationCapacityReconciler, DEFAULT_NEARBY_RADIUS_KM};
