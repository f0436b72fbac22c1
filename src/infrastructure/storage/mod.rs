//! In-process storage
//!
//! Repository implementations that keep everything in memory; used by tests
//! and when the service runs with `database.url = "memory"`.

mod memory;
#[cfg(test)]
pub(crate) mod slow;

pub use memory::{InMemoryBookingRepository, InMemoryRepositoryProvider, InMemoryStationRepository};
