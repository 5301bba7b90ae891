use super::{DeployContexts, PreDeployContexts, deployer_failure, expect_service, require, settle};
use crate::deployer::Phase;
use crate::error::{DeployError, Result};
use crate::registry::{RegisteredDeployer, ServiceRegistry};
use phaseflow_core::{DeployContext, DeployOrder, Environment, PreDeployContext, ServiceContext};
use tracing::{debug, info, instrument};

/// Deploy every service of `level`
///
/// `deploy_contexts` holds the results of all earlier levels; each service
/// receives the contexts of its direct dependencies in declaration order.
#[instrument(skip_all, fields(environment = %environment.environment_name, level = level))]
pub async fn deploy_services_in_level(
    environment: &Environment,
    registry: &ServiceRegistry,
    pre_deploy_contexts: &PreDeployContexts,
    deploy_contexts: &DeployContexts,
    order: &DeployOrder,
    level: usize,
) -> Result<DeployContexts> {
    let services = order.level(level).unwrap_or_default();
    info!(services = ?services, "Executing deploy phase");

    let mut units = Vec::new();
    for name in services {
        let service = environment.require_service(name)?;
        let registered = registry.resolve_type(&service.service_type)?;
        let own_pre = require(pre_deploy_contexts, name, Phase::PreDeploy)?;

        let mut dependencies = Vec::with_capacity(service.dependencies().len());
        for dependency in service.dependencies() {
            let context =
                deploy_contexts
                    .get(dependency)
                    .ok_or_else(|| DeployError::MissingDependency {
                        service: name.clone(),
                        dependency: dependency.clone(),
                        phase: Phase::Deploy,
                    })?;
            dependencies.push(context);
        }

        units.push((
            name.clone(),
            deploy_service(registered, service, own_pre, dependencies),
        ));
    }

    settle(Phase::Deploy, units).await
}

async fn deploy_service(
    registered: &RegisteredDeployer,
    service: &ServiceContext,
    own_pre: &PreDeployContext,
    dependencies: Vec<&DeployContext>,
) -> Result<DeployContext> {
    if !registered.capabilities().supports(Phase::Deploy) {
        debug!(service = %service.service_name, "deploy not required");
        return Ok(DeployContext::new(service));
    }

    debug!(
        service = %service.service_name,
        dependencies = dependencies.len(),
        "Deploying service"
    );
    let context = registered
        .deployer()
        .deploy(service, own_pre, &dependencies)
        .await
        .map_err(|e| deployer_failure(service, Phase::Deploy, e))?;
    expect_service(service, Phase::Deploy, context)
}
