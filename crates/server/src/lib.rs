//! HTTP API server for AU metadata.
//!
//! This crate provides the HTTP surface:
//! - Basic authentication gate and role-based authorization
//! - Paginated AU metadata retrieval with generation-bound continuation tokens
//! - AU metadata submission and deletion
//! - DOI and OpenURL resolution
//! - Status and Prometheus metrics endpoints

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pager;
pub mod routes;
pub mod state;

pub use auth::{Principal, TraceId};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
