use super::{UnDeployContexts, deployer_failure, expect_service, settle};
use crate::deployer::Phase;
use crate::error::Result;
use crate::registry::{RegisteredDeployer, ServiceRegistry};
use phaseflow_core::{DeployOrder, Environment, ServiceContext, UnDeployContext};
use tracing::{debug, info, instrument};

/// Tear down every service of `level`
#[instrument(skip_all, fields(environment = %environment.environment_name, level = level))]
pub async fn un_deploy_services_in_level(
    environment: &Environment,
    registry: &ServiceRegistry,
    order: &DeployOrder,
    level: usize,
) -> Result<UnDeployContexts> {
    let services = order.level(level).unwrap_or_default();
    info!(services = ?services, "Executing un_deploy phase");

    let mut units = Vec::new();
    for name in services {
        let service = environment.require_service(name)?;
        let registered = registry.resolve_type(&service.service_type)?;
        units.push((name.clone(), un_deploy_service(registered, service)));
    }

    settle(Phase::UnDeploy, units).await
}

async fn un_deploy_service(
    registered: &RegisteredDeployer,
    service: &ServiceContext,
) -> Result<UnDeployContext> {
    if !registered.capabilities().supports(Phase::UnDeploy) {
        return Ok(UnDeployContext::new(service));
    }

    debug!(service = %service.service_name, "Deleting service");
    let context = registered
        .deployer()
        .un_deploy(service)
        .await
        .map_err(|e| deployer_failure(service, Phase::UnDeploy, e))?;
    expect_service(service, Phase::UnDeploy, context)
}
