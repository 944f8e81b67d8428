//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the controllers and the remote imaging service.

mod imaging_api;

pub use imaging_api::{ApiError, HealthStatus, ImagingApi, ANALYSIS_FALLBACK_MESSAGE};
