//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`convert`] - JPEG upload and conversion
//! - [`files`] - Artifact download and recent conversions
//! - [`system`] - Health and OpenAPI

mod convert;
mod files;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use convert::*;
pub use files::*;
pub use system::*;
