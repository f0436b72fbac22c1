//! Station aggregate
//!
//! Contains the Station entity, distance helper, and repository interface.

pub mod geo;
pub mod model;
pub mod repository;

pub use geo::haversine_km;
pub use model::{
    Location, NewStation, OperatingHours, Station, StationChanges, StationFilter, StationStatus,
    StationType, MAX_SLOTS, MIN_SLOTS,
};
pub use repository::StationRepository;
