//! Deploy engine error types

use crate::deployer::Phase;
use phaseflow_core::{CoreError, ServiceType};
use thiserror::Error;

/// Who has to act on an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The environment definition needs fixing
    Configuration,
    /// A deployer (or the registry wiring) broke the deployer contract
    Contract,
    /// A provider call made by a deployer failed
    Provider,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration error"),
            ErrorKind::Contract => write!(f, "deployer contract violation"),
            ErrorKind::Provider => write!(f, "provider failure"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Environment(#[from] CoreError),

    #[error("Errors while checking environment '{environment}':\n{}", .errors.join("\n"))]
    CheckFailed {
        environment: String,
        errors: Vec<String>,
    },

    #[error("No such service type: {0}")]
    UnknownServiceType(ServiceType),

    #[error("Service type already registered: {0}")]
    DuplicateServiceType(ServiceType),

    #[error("Extension prefix already registered: {0}")]
    DuplicateExtension(String),

    #[error("Failed to load extension '{prefix}': {source}")]
    ExtensionLoad {
        prefix: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(
        "Deployer for '{service_type}' broke the {phase} contract on service '{service}': {message}"
    )]
    ContractViolation {
        service_type: ServiceType,
        service: String,
        phase: Phase,
        message: String,
    },

    #[error("Missing {phase} result for dependency '{dependency}' of service '{service}'")]
    MissingDependency {
        service: String,
        dependency: String,
        phase: Phase,
    },

    #[error("No {phase} result for service '{service}'")]
    MissingContext { service: String, phase: Phase },

    #[error("{phase} failed on service '{service}' ({service_type}): {source:#}")]
    PhaseFailed {
        phase: Phase,
        service: String,
        service_type: ServiceType,
        #[source]
        source: anyhow::Error,
    },
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::Environment(_) | DeployError::CheckFailed { .. } => {
                ErrorKind::Configuration
            }
            DeployError::UnknownServiceType(_)
            | DeployError::DuplicateServiceType(_)
            | DeployError::DuplicateExtension(_)
            | DeployError::ExtensionLoad { .. }
            | DeployError::ContractViolation { .. }
            | DeployError::MissingDependency { .. }
            | DeployError::MissingContext { .. } => ErrorKind::Contract,
            DeployError::PhaseFailed { .. } => ErrorKind::Provider,
        }
    }

    /// Service type to blame, for contract violations raised by a deployer
    pub fn service_type(&self) -> Option<&ServiceType> {
        match self {
            DeployError::UnknownServiceType(ty)
            | DeployError::DuplicateServiceType(ty)
            | DeployError::ContractViolation {
                service_type: ty, ..
            }
            | DeployError::PhaseFailed {
                service_type: ty, ..
            } => Some(ty),
            _ => None,
        }
    }

    pub(crate) fn contract(
        service: &phaseflow_core::ServiceContext,
        phase: Phase,
        message: impl Into<String>,
    ) -> Self {
        DeployError::ContractViolation {
            service_type: service.service_type.clone(),
            service: service.service_name.clone(),
            phase,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = DeployError::from(CoreError::CircularDependency {
            services: vec!["a".into(), "b".into()],
        });
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(
            err.to_string(),
            "Circular dependency detected between services: a, b"
        );

        let err = DeployError::UnknownServiceType(ServiceType::new("acme", "queue"));
        assert_eq!(err.kind(), ErrorKind::Contract);
        assert_eq!(err.to_string(), "No such service type: acme::queue");

        let err = DeployError::PhaseFailed {
            phase: Phase::Deploy,
            service: "db".into(),
            service_type: ServiceType::builtin("kv"),
            source: anyhow::anyhow!("throttled"),
        };
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.to_string(), "deploy failed on service 'db' (kv): throttled");
        assert_eq!(err.service_type(), Some(&ServiceType::builtin("kv")));
    }

    #[test]
    fn test_check_failed_lists_every_error() {
        let err = DeployError::CheckFailed {
            environment: "dev".into(),
            errors: vec!["first".into(), "second".into()],
        };
        assert_eq!(
            err.to_string(),
            "Errors while checking environment 'dev':\nfirst\nsecond"
        );
    }
}
