use super::{UnPreDeployContexts, deployer_failure, expect_service, settle};
use crate::deployer::Phase;
use crate::error::Result;
use crate::registry::{RegisteredDeployer, ServiceRegistry};
use phaseflow_core::{Environment, ServiceContext, UnPreDeployContext};
use tracing::{debug, info, instrument};

/// Remove pre-deploy resources of every service at once
#[instrument(skip_all, fields(environment = %environment.environment_name))]
pub async fn un_pre_deploy_services(
    environment: &Environment,
    registry: &ServiceRegistry,
) -> Result<UnPreDeployContexts> {
    info!("Executing un_pre_deploy phase");

    let mut units = Vec::with_capacity(environment.len());
    for service in environment.services() {
        let registered = registry.resolve_type(&service.service_type)?;
        units.push((
            service.service_name.clone(),
            un_pre_deploy_service(registered, service),
        ));
    }

    settle(Phase::UnPreDeploy, units).await
}

async fn un_pre_deploy_service(
    registered: &RegisteredDeployer,
    service: &ServiceContext,
) -> Result<UnPreDeployContext> {
    if !registered.capabilities().supports(Phase::UnPreDeploy) {
        return Ok(UnPreDeployContext::new(service));
    }

    debug!(service = %service.service_name, "Running un_pre_deploy");
    let context = registered
        .deployer()
        .un_pre_deploy(service)
        .await
        .map_err(|e| deployer_failure(service, Phase::UnPreDeploy, e))?;
    expect_service(service, Phase::UnPreDeploy, context)
}
