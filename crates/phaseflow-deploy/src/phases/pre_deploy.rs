use super::{PreDeployContexts, deployer_failure, expect_service, settle};
use crate::deployer::Phase;
use crate::error::Result;
use crate::registry::{RegisteredDeployer, ServiceRegistry};
use phaseflow_core::{Environment, PreDeployContext, ServiceContext};
use tracing::{debug, info, instrument};

/// Run pre-deploy on every service of the environment at once
///
/// Pre-deploy only touches a service's own resources, so levels do not apply.
#[instrument(skip_all, fields(environment = %environment.environment_name))]
pub async fn pre_deploy_services(
    environment: &Environment,
    registry: &ServiceRegistry,
) -> Result<PreDeployContexts> {
    info!("Executing pre_deploy phase");

    let mut units = Vec::with_capacity(environment.len());
    for service in environment.services() {
        let registered = registry.resolve_type(&service.service_type)?;
        units.push((
            service.service_name.clone(),
            pre_deploy_service(service, registered),
        ));
    }

    settle(Phase::PreDeploy, units).await
}

async fn pre_deploy_service(
    service: &ServiceContext,
    registered: &RegisteredDeployer,
) -> Result<PreDeployContext> {
    if !registered.capabilities().supports(Phase::PreDeploy) {
        debug!(service = %service.service_name, "pre_deploy not required");
        return Ok(PreDeployContext::new(service));
    }

    debug!(service = %service.service_name, "Running pre_deploy");
    let context = registered
        .deployer()
        .pre_deploy(service)
        .await
        .map_err(|e| deployer_failure(service, Phase::PreDeploy, e))?;
    expect_service(service, Phase::PreDeploy, context)
}
