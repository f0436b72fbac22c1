pub mod services;

pub use services::{
    BookingLifecycle, NearbyStation, StationCapacityReconciler, DEFAULT_NEARBY_RADIUS_KM,
};
