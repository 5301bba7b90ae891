//! Service deployer contract
//!
//! Every service type is handled by one [`ServiceDeployer`]. A deployer states
//! up front which optional phases it takes part in through its
//! [`Capabilities`]; the engine reads them once at registration and never
//! calls a phase method that was not declared.

use async_trait::async_trait;
use phaseflow_core::{
    BindContext, ConsumeEventsContext, DeployContext, DeployOutputType, EventConsumerConfig,
    PreDeployContext, ProduceEventsContext, ServiceContext, UnBindContext, UnDeployContext,
    UnPreDeployContext,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Check,
    PreDeploy,
    Bind,
    Deploy,
    ConsumeEvents,
    ProduceEvents,
    UnBind,
    UnDeploy,
    UnPreDeploy,
}

impl Phase {
    pub const ALL: [Phase; 9] = [
        Phase::Check,
        Phase::PreDeploy,
        Phase::Bind,
        Phase::Deploy,
        Phase::ConsumeEvents,
        Phase::ProduceEvents,
        Phase::UnBind,
        Phase::UnDeploy,
        Phase::UnPreDeploy,
    ];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Check => write!(f, "check"),
            Phase::PreDeploy => write!(f, "pre_deploy"),
            Phase::Bind => write!(f, "bind"),
            Phase::Deploy => write!(f, "deploy"),
            Phase::ConsumeEvents => write!(f, "consume_events"),
            Phase::ProduceEvents => write!(f, "produce_events"),
            Phase::UnBind => write!(f, "un_bind"),
            Phase::UnDeploy => write!(f, "un_deploy"),
            Phase::UnPreDeploy => write!(f, "un_pre_deploy"),
        }
    }
}

/// Set of optional phases a deployer implements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities(BTreeSet<Phase>);

impl Capabilities {
    /// A deployer taking part in no optional phase
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self(Phase::ALL.into_iter().collect())
    }

    pub fn with(mut self, phase: Phase) -> Self {
        self.0.insert(phase);
        self
    }

    pub fn supports(&self, phase: Phase) -> bool {
        self.0.contains(&phase)
    }

    pub fn iter(&self) -> impl Iterator<Item = Phase> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Phase> for Capabilities {
    fn from_iter<T: IntoIterator<Item = Phase>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Declared metadata of a deployer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployerInfo {
    /// Event type this service delivers to when consuming events
    pub provided_event_type: Option<String>,

    /// Event types this service can produce events to
    pub produced_events_supported_types: Vec<String>,

    /// Outputs this service hands to its dependents
    pub produced_deploy_output_types: Vec<DeployOutputType>,

    /// Outputs this service accepts from its dependencies
    pub consumed_deploy_output_types: Vec<DeployOutputType>,

    /// Whether the service tags its resources; enables required-tag checks
    pub supports_tagging: bool,
}

impl Default for DeployerInfo {
    fn default() -> Self {
        Self {
            provided_event_type: None,
            produced_events_supported_types: Vec::new(),
            produced_deploy_output_types: Vec::new(),
            consumed_deploy_output_types: Vec::new(),
            supports_tagging: true,
        }
    }
}

/// Raised by the default body of a phase method
///
/// Seeing it means a deployer declared a phase in its capabilities without
/// overriding the corresponding method.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("phase '{0}' is declared but not implemented")]
pub struct PhaseNotImplemented(pub Phase);

fn not_implemented<T>(phase: Phase) -> anyhow::Result<T> {
    Err(PhaseNotImplemented(phase).into())
}

/// Plugin handling one service type
///
/// Errors returned from the phase methods are provider failures and are
/// reported as-is; the engine does not retry.
#[async_trait]
pub trait ServiceDeployer: Send + Sync {
    /// Declared metadata
    fn info(&self) -> DeployerInfo {
        DeployerInfo::default()
    }

    /// Optional phases this deployer implements
    fn capabilities(&self) -> Capabilities;

    /// Validate the service's parameters; returns human-readable errors
    fn check(&self, own: &ServiceContext, dependencies: &[&ServiceContext]) -> Vec<String> {
        let _ = (own, dependencies);
        Vec::new()
    }

    async fn pre_deploy(&self, own: &ServiceContext) -> anyhow::Result<PreDeployContext> {
        let _ = own;
        not_implemented(Phase::PreDeploy)
    }

    async fn bind(
        &self,
        own: &ServiceContext,
        own_pre_deploy: &PreDeployContext,
        dependent: &ServiceContext,
        dependent_pre_deploy: &PreDeployContext,
    ) -> anyhow::Result<BindContext> {
        let _ = (own, own_pre_deploy, dependent, dependent_pre_deploy);
        not_implemented(Phase::Bind)
    }

    async fn deploy(
        &self,
        own: &ServiceContext,
        own_pre_deploy: &PreDeployContext,
        dependencies: &[&DeployContext],
    ) -> anyhow::Result<DeployContext> {
        let _ = (own, own_pre_deploy, dependencies);
        not_implemented(Phase::Deploy)
    }

    async fn consume_events(
        &self,
        own: &ServiceContext,
        own_deploy: &DeployContext,
        event_config: &EventConsumerConfig,
        producer: &ServiceContext,
        producer_deploy: &DeployContext,
    ) -> anyhow::Result<ConsumeEventsContext> {
        let _ = (own, own_deploy, event_config, producer, producer_deploy);
        not_implemented(Phase::ConsumeEvents)
    }

    async fn produce_events(
        &self,
        own: &ServiceContext,
        own_deploy: &DeployContext,
        event_config: &EventConsumerConfig,
        consumer: &ServiceContext,
        consumer_deploy: &DeployContext,
    ) -> anyhow::Result<ProduceEventsContext> {
        let _ = (own, own_deploy, event_config, consumer, consumer_deploy);
        not_implemented(Phase::ProduceEvents)
    }

    async fn un_bind(
        &self,
        own: &ServiceContext,
        dependent: &ServiceContext,
    ) -> anyhow::Result<UnBindContext> {
        let _ = (own, dependent);
        not_implemented(Phase::UnBind)
    }

    async fn un_deploy(&self, own: &ServiceContext) -> anyhow::Result<UnDeployContext> {
        let _ = own;
        not_implemented(Phase::UnDeploy)
    }

    async fn un_pre_deploy(&self, own: &ServiceContext) -> anyhow::Result<UnPreDeployContext> {
        let _ = own;
        not_implemented(Phase::UnPreDeploy)
    }
}
