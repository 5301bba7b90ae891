//! Phase execution
//!
//! One module per lifecycle phase. Every phase resolves the deployer of each
//! unit it processes (a service, or a dependency edge), calls the deployer if
//! it declared the phase and otherwise substitutes the empty context, checks
//! the returned context belongs to the unit, and collects the results into a
//! table keyed by service name or [`EdgeKey`].
//!
//! Units of one phase invocation run concurrently. All of them are awaited
//! before the phase returns; if any failed, the first failure in dispatch order
//! is returned and the rest are logged.

mod bind;
mod check;
mod consume_events;
mod deploy;
mod pre_deploy;
mod produce_events;
mod un_bind;
mod un_deploy;
mod un_pre_deploy;

pub use bind::bind_services_in_level;
pub use check::check_services;
pub use consume_events::consume_events;
pub use deploy::deploy_services_in_level;
pub use pre_deploy::pre_deploy_services;
pub use produce_events::produce_events;
pub use un_bind::un_bind_services_in_level;
pub use un_deploy::un_deploy_services_in_level;
pub use un_pre_deploy::un_pre_deploy_services;

use crate::deployer::{Phase, PhaseNotImplemented};
use crate::error::{DeployError, Result};
use futures_util::future::join_all;
use phaseflow_core::{
    BindContext, ConsumeEventsContext, DeployContext, EdgeKey, EdgePhaseContext,
    PreDeployContext, ProduceEventsContext, ServiceContext, ServicePhaseContext, UnBindContext,
    UnDeployContext, UnPreDeployContext,
};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use tracing::error;

pub type PreDeployContexts = BTreeMap<String, PreDeployContext>;
pub type BindContexts = BTreeMap<EdgeKey, BindContext>;
pub type DeployContexts = BTreeMap<String, DeployContext>;
pub type ConsumeEventsContexts = BTreeMap<EdgeKey, ConsumeEventsContext>;
pub type ProduceEventsContexts = BTreeMap<EdgeKey, ProduceEventsContext>;
pub type UnBindContexts = BTreeMap<EdgeKey, UnBindContext>;
pub type UnDeployContexts = BTreeMap<String, UnDeployContext>;
pub type UnPreDeployContexts = BTreeMap<String, UnPreDeployContext>;

/// Run every unit to completion and collect the results by key
async fn settle<K, V, F>(phase: Phase, units: Vec<(K, F)>) -> Result<BTreeMap<K, V>>
where
    K: Ord + Display,
    F: Future<Output = Result<V>>,
{
    let (keys, futures): (Vec<K>, Vec<F>) = units.into_iter().unzip();
    let outcomes = join_all(futures).await;

    let mut results = BTreeMap::new();
    let mut first_error = None;
    for (key, outcome) in keys.into_iter().zip(outcomes) {
        match outcome {
            Ok(context) => {
                results.insert(key, context);
            }
            Err(err) if first_error.is_none() => first_error = Some(err),
            Err(err) => {
                error!(phase = %phase, unit = %key, error = %err, "Additional failure in phase");
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(results),
    }
}

/// Map an error returned by a deployer method
fn deployer_failure(service: &ServiceContext, phase: Phase, err: anyhow::Error) -> DeployError {
    if let Some(PhaseNotImplemented(declared)) = err.downcast_ref::<PhaseNotImplemented>() {
        return DeployError::contract(
            service,
            phase,
            format!("'{declared}' is declared in its capabilities but not implemented"),
        );
    }
    DeployError::PhaseFailed {
        phase,
        service: service.service_name.clone(),
        service_type: service.service_type.clone(),
        source: err,
    }
}

/// Reject a context produced for some other service
fn expect_service<C: ServicePhaseContext>(
    service: &ServiceContext,
    phase: Phase,
    context: C,
) -> Result<C> {
    let identity = context.identity();
    if *identity != service.identity() {
        return Err(DeployError::contract(
            service,
            phase,
            format!(
                "returned a context for service '{}' ({})",
                identity.service_name, identity.service_type
            ),
        ));
    }
    Ok(context)
}

/// Reject an edge context whose sides do not match the invoked pair
fn expect_edge<C: EdgePhaseContext>(
    owner: &ServiceContext,
    peer: &ServiceContext,
    phase: Phase,
    context: C,
) -> Result<C> {
    if *context.owner() != owner.identity() || *context.peer() != peer.identity() {
        return Err(DeployError::contract(
            owner,
            phase,
            format!(
                "returned a context for '{}' -> '{}', expected '{}' -> '{}'",
                context.owner().service_name,
                context.peer().service_name,
                owner.service_name,
                peer.service_name
            ),
        ));
    }
    Ok(context)
}

/// Fetch a context an earlier phase must have produced
fn require<'a, V>(
    table: &'a BTreeMap<String, V>,
    service_name: &str,
    phase: Phase,
) -> Result<&'a V> {
    table
        .get(service_name)
        .ok_or_else(|| DeployError::MissingContext {
            service: service_name.to_string(),
            phase,
        })
}

#[cfg(test)]
pub(crate) mod testing {
    use phaseflow_core::{AccountConfig, Environment, ServiceConfig, ServiceContext, ServiceType};
    use std::sync::Arc;

    /// Environment `shop/dev` built from `(name, type, dependencies)` triples
    pub fn environment(services: &[(&str, &str, &[&str])]) -> Environment {
        let account = Arc::new(AccountConfig::new("123456789012", "us-west-2"));
        let mut env = Environment::new("shop", "dev", account.clone());
        for (name, ty, deps) in services {
            let service_type: ServiceType = ty.parse().unwrap();
            let config = ServiceConfig::new(*ty).with_dependencies(deps.iter().copied());
            env.add_service(ServiceContext::new(
                "shop",
                "dev",
                *name,
                service_type,
                config,
                account.clone(),
            ))
            .unwrap();
        }
        env
    }
}
