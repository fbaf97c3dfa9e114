//! # API Shared
//!
//! Shared definitions for the CareTrack APIs.
//!
//! Contains:
//! - HTTP wire types (`wire` module): request bodies, query parameters, responses and the single
//!   error envelope, all with serde and OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `caretrack-core` (which produces the response types) and `api-rest`.

pub mod health;
pub mod wire;

pub use health::HealthService;
pub use wire::*;
