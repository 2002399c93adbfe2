//! Repository traits for metadata operations.

pub mod credentials;
pub mod items;
pub mod resolver;

pub use credentials::CredentialRepo;
pub use items::ItemRepo;
pub use resolver::{ResolutionCriteria, UrlResolver};
