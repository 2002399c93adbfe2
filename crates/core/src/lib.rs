//! Core domain types for the aumeta metadata service.
//!
//! This crate defines the data model shared by the store and the HTTP server:
//! - Roles and per-route role requirements
//! - Password digests for credential verification
//! - Archival Unit item metadata
//! - The pagination continuation token codec
//! - OpenURL parameter parsing and URL aggregation
//! - Application configuration

pub mod config;
pub mod credential;
pub mod cursor;
pub mod error;
pub mod item;
pub mod openurl;
pub mod role;

pub use credential::PasswordDigest;
pub use cursor::ContinuationToken;
pub use error::{Error, Result};
pub use item::ItemMetadata;
pub use openurl::{OpenUrlParams, UrlInfo};
pub use role::{Role, RoleRequirement};

/// Default number of items per metadata page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
