//! HTTP REST API interfaces
//!
//! - `common`: response envelope, error mapping, `ValidatedJson`
//! - `modules`: per-resource DTOs and handlers, plus health, metrics and request-id
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, AppState};
