//! # API Shared
//!
//! Shared definitions for the research REST API.
//!
//! Contains:
//! - Request and response bodies (`dto` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//! - Bearer-token identity resolution
//!
//! Used by `api-rest` and the server binary.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{AuthError, IdentityProvider, StaticTokenIdentity};
pub use dto::*;
pub use health::HealthService;
