//! PhaseFlow deploy engine
//!
//! Drives an [`Environment`](phaseflow_core::Environment) through the nine
//! lifecycle phases, dispatching each service to the deployer registered for
//! its type.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 lifecycle                     │
//! │   run_deploy / run_teardown / *_environment   │
//! └───────────────┬──────────────────────────────┘
//!                 │
//! ┌───────────────▼──────────────────────────────┐
//! │                  phases                       │
//! │  check  pre_deploy  bind  deploy  events ...  │
//! └───────┬───────────────────────┬──────────────┘
//!         │                       │
//! ┌───────▼────────┐      ┌───────▼──────────────┐
//! │ ServiceRegistry│ ───► │ dyn ServiceDeployer  │
//! │ (prefix, type) │      │ (plugins)            │
//! └────────────────┘      └──────────────────────┘
//! ```

pub mod deployer;
pub mod error;
pub mod lifecycle;
pub mod phases;
pub mod registry;

// Re-exports
pub use deployer::{Capabilities, DeployerInfo, Phase, PhaseNotImplemented, ServiceDeployer};
pub use error::{DeployError, ErrorKind, Result};
pub use lifecycle::{
    DeployOutcome, EnvironmentResult, ResultStatus, TeardownOutcome, check_environment,
    delete_environment, deploy_environment, deploy_environments, run_deploy, run_teardown,
};
pub use registry::{Extension, ExtensionContext, RegisteredDeployer, ServiceRegistry};

/// `async_trait` re-export so deployer crates need not depend on it directly
pub use async_trait::async_trait;
