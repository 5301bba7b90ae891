//! Deploy and teardown workflows
//!
//! ```text
//! deploy:   plan → check → pre_deploy → (bind → deploy) per level ↑ → consume_events → produce_events
//! teardown: plan → (un_bind → un_deploy) per level ↓ → un_pre_deploy
//! ```
//!
//! Every arrow is a barrier: nothing starts before the previous step has
//! settled for all of its units.

use crate::error::{DeployError, ErrorKind, Result};
use crate::phases::{
    self, BindContexts, ConsumeEventsContexts, DeployContexts, PreDeployContexts,
    ProduceEventsContexts, UnBindContexts, UnDeployContexts, UnPreDeployContexts,
};
use crate::registry::ServiceRegistry;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use phaseflow_core::{DeployOrder, Environment};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

/// Everything a successful deploy produced
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    pub order: DeployOrder,
    pub pre_deploy_contexts: PreDeployContexts,
    pub bind_contexts: BindContexts,
    pub deploy_contexts: DeployContexts,
    pub consume_events_contexts: ConsumeEventsContexts,
    pub produce_events_contexts: ProduceEventsContexts,
}

/// Everything a successful teardown produced
#[derive(Debug, Clone)]
pub struct TeardownOutcome {
    pub order: DeployOrder,
    pub un_bind_contexts: UnBindContexts,
    pub un_deploy_contexts: UnDeployContexts,
    pub un_pre_deploy_contexts: UnPreDeployContexts,
}

/// Resolve the deployer of every service; fails before any deployer runs
fn resolve_all(environment: &Environment, registry: &ServiceRegistry) -> Result<()> {
    for service in environment.services() {
        registry.resolve_type(&service.service_type)?;
    }
    Ok(())
}

/// Plan the environment and run the check phase
///
/// Dependency and event-consumer errors abort before any deployer is called;
/// check errors are returned together as [`DeployError::CheckFailed`].
pub fn check_environment(
    environment: &Environment,
    registry: &ServiceRegistry,
) -> Result<DeployOrder> {
    let order = DeployOrder::plan(environment)?;
    environment.validate_event_consumers()?;
    resolve_all(environment, registry)?;

    let errors = phases::check_services(environment, registry)?;
    if !errors.is_empty() {
        return Err(DeployError::CheckFailed {
            environment: environment.environment_name.clone(),
            errors,
        });
    }
    Ok(order)
}

/// Deploy every service of the environment
#[instrument(skip_all, fields(app = %environment.app_name, environment = %environment.environment_name))]
pub async fn run_deploy(
    environment: &Environment,
    registry: &ServiceRegistry,
) -> Result<DeployOutcome> {
    info!(services = environment.len(), "Starting deploy");

    let order = check_environment(environment, registry)?;
    let pre_deploy_contexts = phases::pre_deploy_services(environment, registry).await?;

    let mut bind_contexts = BindContexts::new();
    let mut deploy_contexts = DeployContexts::new();
    for level in order.ascending() {
        let bound = phases::bind_services_in_level(
            environment,
            registry,
            &pre_deploy_contexts,
            &order,
            level,
        )
        .await?;
        bind_contexts.extend(bound);

        let deployed = phases::deploy_services_in_level(
            environment,
            registry,
            &pre_deploy_contexts,
            &deploy_contexts,
            &order,
            level,
        )
        .await?;
        deploy_contexts.extend(deployed);
    }

    let consume_events_contexts =
        phases::consume_events(environment, registry, &deploy_contexts).await?;
    let produce_events_contexts =
        phases::produce_events(environment, registry, &deploy_contexts).await?;

    info!(levels = order.len(), "Deploy finished");
    Ok(DeployOutcome {
        order,
        pre_deploy_contexts,
        bind_contexts,
        deploy_contexts,
        consume_events_contexts,
        produce_events_contexts,
    })
}

/// Remove every service of the environment, highest level first
#[instrument(skip_all, fields(app = %environment.app_name, environment = %environment.environment_name))]
pub async fn run_teardown(
    environment: &Environment,
    registry: &ServiceRegistry,
) -> Result<TeardownOutcome> {
    info!(services = environment.len(), "Starting teardown");

    let order = DeployOrder::plan(environment)?;
    resolve_all(environment, registry)?;

    let mut un_bind_contexts = UnBindContexts::new();
    let mut un_deploy_contexts = UnDeployContexts::new();
    for level in order.descending() {
        let unbound =
            phases::un_bind_services_in_level(environment, registry, &order, level).await?;
        un_bind_contexts.extend(unbound);

        let removed =
            phases::un_deploy_services_in_level(environment, registry, &order, level).await?;
        un_deploy_contexts.extend(removed);
    }

    let un_pre_deploy_contexts = phases::un_pre_deploy_services(environment, registry).await?;

    info!(levels = order.len(), "Teardown finished");
    Ok(TeardownOutcome {
        order,
        un_bind_contexts,
        un_deploy_contexts,
        un_pre_deploy_contexts,
    })
}

/// Final state of an environment run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failure,
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultStatus::Success => write!(f, "success"),
            ResultStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Result of deploying or deleting one environment
#[derive(Debug)]
pub struct EnvironmentResult {
    pub environment_name: String,
    pub status: ResultStatus,
    pub message: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub error: Option<DeployError>,
}

impl EnvironmentResult {
    fn finish<T>(environment: &Environment, started_at: DateTime<Utc>, result: Result<T>) -> Self {
        let finished_at = Utc::now();
        match result {
            Ok(_) => Self {
                environment_name: environment.environment_name.clone(),
                status: ResultStatus::Success,
                message: "Success".to_string(),
                started_at,
                finished_at,
                error: None,
            },
            Err(err) => {
                error!(
                    environment = %environment.environment_name,
                    kind = %err.kind(),
                    error = %err,
                    "Environment run failed"
                );
                Self {
                    environment_name: environment.environment_name.clone(),
                    status: ResultStatus::Failure,
                    message: err.to_string(),
                    started_at,
                    finished_at,
                    error: Some(err),
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(DeployError::kind)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Deploy one environment, capturing any failure in the result
pub async fn deploy_environment(
    environment: &Environment,
    registry: &ServiceRegistry,
) -> EnvironmentResult {
    let started_at = Utc::now();
    let result = run_deploy(environment, registry).await;
    EnvironmentResult::finish(environment, started_at, result)
}

/// Tear down one environment, capturing any failure in the result
pub async fn delete_environment(
    environment: &Environment,
    registry: &ServiceRegistry,
) -> EnvironmentResult {
    let started_at = Utc::now();
    let result = run_teardown(environment, registry).await;
    EnvironmentResult::finish(environment, started_at, result)
}

/// Deploy several environments concurrently; results follow input order
pub async fn deploy_environments(
    environments: &[Environment],
    registry: &ServiceRegistry,
) -> Vec<EnvironmentResult> {
    join_all(
        environments
            .iter()
            .map(|environment| deploy_environment(environment, registry)),
    )
    .await
}
