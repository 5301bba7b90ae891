use super::{UnBindContexts, deployer_failure, expect_edge, settle};
use crate::deployer::Phase;
use crate::error::Result;
use crate::registry::{RegisteredDeployer, ServiceRegistry};
use phaseflow_core::{DeployOrder, EdgeKey, Environment, ServiceContext, UnBindContext};
use tracing::{debug, info, instrument};

/// Remove the bindings between every service of `level` and its dependents
#[instrument(skip_all, fields(environment = %environment.environment_name, level = level))]
pub async fn un_bind_services_in_level(
    environment: &Environment,
    registry: &ServiceRegistry,
    order: &DeployOrder,
    level: usize,
) -> Result<UnBindContexts> {
    let services = order.level(level).unwrap_or_default();
    info!(services = ?services, "Executing un_bind phase");

    let mut units = Vec::new();
    for name in services {
        let dependency = environment.require_service(name)?;
        let registered = registry.resolve_type(&dependency.service_type)?;
        for dependent in environment.dependents_of(name) {
            units.push((
                EdgeKey::new(&dependent.service_name, name),
                un_bind_edge(registered, dependency, dependent),
            ));
        }
    }

    settle(Phase::UnBind, units).await
}

async fn un_bind_edge(
    registered: &RegisteredDeployer,
    dependency: &ServiceContext,
    dependent: &ServiceContext,
) -> Result<UnBindContext> {
    if !registered.capabilities().supports(Phase::UnBind) {
        return Ok(UnBindContext::new(dependency, dependent));
    }

    debug!(
        dependency = %dependency.service_name,
        dependent = %dependent.service_name,
        "Unbinding service"
    );
    let context = registered
        .deployer()
        .un_bind(dependency, dependent)
        .await
        .map_err(|e| deployer_failure(dependency, Phase::UnBind, e))?;
    expect_edge(dependency, dependent, Phase::UnBind, context)
}
