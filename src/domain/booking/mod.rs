//! Booking aggregate
//!
//! Contains the Booking entity, its status machine, and repository interface.

pub mod model;
pub mod policy;
pub mod repository;

pub use model::{
    Booking, BookingChanges, BookingFilter, BookingStatus, NewBooking, UserBookingStats,
};
pub use policy::BookingPolicy;
pub use repository::BookingRepository;
