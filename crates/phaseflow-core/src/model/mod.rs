//! Model definitions
//!
//! Data model for environments, services and phase results.
//! Each concern lives in its own module.

mod account;
mod context;
mod environment;
mod service;
mod service_type;

use std::collections::BTreeMap;

/// Key/value tags
pub type Tags = BTreeMap<String, String>;

// Re-exports
pub use account::*;
pub use context::*;
pub use environment::*;
pub use service::*;
pub use service_type::*;
