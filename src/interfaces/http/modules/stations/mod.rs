//! `/api/v1/stations`

pub mod dto;
pub mod handlers;

pub use handlers::StationAppState;
