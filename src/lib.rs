//! # EV Charging Booking Service
//!
//! Booking lifecycle and station capacity reconciliation for EV charging
//! stations, served over a REST API.
//!
//! ## Architecture
//!
//! - **domain**: bookings, stations, their rules and repository traits
//! - **application**: `BookingLifecycle` and `StationCapacityReconciler`
//! - **infrastructure**: SeaORM (SQLite) and in-memory repositories
//! - **interfaces**: axum REST API with Swagger documentation
//! - **shared**: errors, clock, graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use application::{BookingLifecycle, StationCapacityReconciler};
pub use config::{config_path, default_config_path, AppConfig};
pub use domain::{DomainError, DomainResult, RepositoryProvider};
pub use infrastructure::{
    connect_and_migrate, init_database, DatabaseConfig, InMemoryRepositoryProvider,
    SeaOrmRepositoryProvider,
};
pub use interfaces::http::{create_api_router, AppState};
