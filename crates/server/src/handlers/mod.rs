//! HTTP request handlers.

pub mod common;
pub mod metadata;
pub mod status;
pub mod urls;

pub use metadata::*;
pub use status::*;
pub use urls::*;
