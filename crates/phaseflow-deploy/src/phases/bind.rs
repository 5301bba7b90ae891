use super::{BindContexts, PreDeployContexts, deployer_failure, expect_edge, require, settle};
use crate::deployer::Phase;
use crate::error::Result;
use crate::registry::{RegisteredDeployer, ServiceRegistry};
use phaseflow_core::{BindContext, DeployOrder, EdgeKey, Environment, PreDeployContext, ServiceContext};
use tracing::{debug, info, instrument};

/// Bind every service of `level` to each service that depends on it
///
/// The deployer of the dependency is invoked once per dependent; dependents
/// may live in any later level. Results are keyed `dependent->dependency`.
#[instrument(skip_all, fields(environment = %environment.environment_name, level = level))]
pub async fn bind_services_in_level(
    environment: &Environment,
    registry: &ServiceRegistry,
    pre_deploy_contexts: &PreDeployContexts,
    order: &DeployOrder,
    level: usize,
) -> Result<BindContexts> {
    let services = order.level(level).unwrap_or_default();
    info!(services = ?services, "Executing bind phase");

    let mut units = Vec::new();
    for name in services {
        let dependency = environment.require_service(name)?;
        let registered = registry.resolve_type(&dependency.service_type)?;
        let dependency_pre = require(pre_deploy_contexts, name, Phase::PreDeploy)?;

        for dependent in environment.dependents_of(name) {
            let dependent_pre =
                require(pre_deploy_contexts, &dependent.service_name, Phase::PreDeploy)?;
            units.push((
                EdgeKey::new(&dependent.service_name, name),
                bind_edge(registered, dependency, dependency_pre, dependent, dependent_pre),
            ));
        }
    }

    settle(Phase::Bind, units).await
}

async fn bind_edge(
    registered: &RegisteredDeployer,
    dependency: &ServiceContext,
    dependency_pre: &PreDeployContext,
    dependent: &ServiceContext,
    dependent_pre: &PreDeployContext,
) -> Result<BindContext> {
    if !registered.capabilities().supports(Phase::Bind) {
        debug!(
            dependency = %dependency.service_name,
            dependent = %dependent.service_name,
            "bind not required"
        );
        return Ok(BindContext::new(dependency, dependent));
    }

    debug!(
        dependency = %dependency.service_name,
        dependent = %dependent.service_name,
        "Binding service"
    );
    let context = registered
        .deployer()
        .bind(dependency, dependency_pre, dependent, dependent_pre)
        .await
        .map_err(|e| deployer_failure(dependency, Phase::Bind, e))?;
    expect_edge(dependency, dependent, Phase::Bind, context)
}
