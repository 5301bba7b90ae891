//! Core error types

use thiserror::Error;

/// Errors raised while building or planning an environment.
///
/// Every variant is a user configuration error: the fix lives in the
/// environment definition, not in a deployer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(
        "Invalid dependency: service '{service}' depends on '{dependency}', which does not exist in the environment"
    )]
    InvalidDependency { service: String, dependency: String },

    #[error(
        "Invalid event consumer: service '{service}' sends events to '{consumer}', which does not exist in the environment"
    )]
    InvalidEventConsumer { service: String, consumer: String },

    #[error("Duplicate dependency: service '{service}' lists '{dependency}' more than once")]
    DuplicateDependency { service: String, dependency: String },

    #[error(
        "Duplicate event consumer: service '{service}' lists '{consumer}' more than once"
    )]
    DuplicateEventConsumer { service: String, consumer: String },

    #[error("Circular dependency detected between services: {}", .services.join(", "))]
    CircularDependency { services: Vec<String> },

    #[error("Duplicate service '{0}' in environment")]
    DuplicateService(String),

    #[error("Invalid service type '{0}': expected '<type>' or '<prefix>::<type>'")]
    InvalidServiceType(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
