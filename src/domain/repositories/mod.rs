//! Repository access for the domain layer
//!
//! - `RepositoryProvider`: unified access to the per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::booking::BookingRepository;
use super::station::StationRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let station = repos.stations().find_by_id("st-1").await?;
///     let bookings = repos.bookings().find(&BookingFilter::default()).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn bookings(&self) -> &dyn BookingRepository;
    fn stations(&self) -> &dyn StationRepository;
}
