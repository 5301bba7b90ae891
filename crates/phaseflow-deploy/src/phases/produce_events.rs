use super::{DeployContexts, ProduceEventsContexts, deployer_failure, expect_edge, require, settle};
use crate::deployer::Phase;
use crate::error::{DeployError, Result};
use crate::registry::{RegisteredDeployer, ServiceRegistry};
use phaseflow_core::{
    CoreError, DeployContext, EdgeKey, Environment, EventConsumerConfig, ProduceEventsContext,
    ServiceContext,
};
use tracing::{debug, info, instrument};

/// Wire every declared event route on the producer side
///
/// The producer's deployer must declare `produce_events`; results are keyed
/// `producer->consumer`.
#[instrument(skip_all, fields(environment = %environment.environment_name))]
pub async fn produce_events(
    environment: &Environment,
    registry: &ServiceRegistry,
    deploy_contexts: &DeployContexts,
) -> Result<ProduceEventsContexts> {
    info!("Executing produce_events phase");

    let mut units = Vec::new();
    for producer in environment.services() {
        if producer.event_consumers().is_empty() {
            continue;
        }

        let registered = registry.resolve_type(&producer.service_type)?;
        if !registered.capabilities().supports(Phase::ProduceEvents) {
            return Err(DeployError::contract(
                producer,
                Phase::ProduceEvents,
                "declares event consumers but the deployer does not produce events",
            ));
        }
        let producer_deploy = require(deploy_contexts, &producer.service_name, Phase::Deploy)?;

        for event_config in producer.event_consumers() {
            let consumer = environment
                .service(&event_config.service_name)
                .ok_or_else(|| CoreError::InvalidEventConsumer {
                    service: producer.service_name.clone(),
                    consumer: event_config.service_name.clone(),
                })?;
            let consumer_deploy =
                require(deploy_contexts, &consumer.service_name, Phase::Deploy)?;
            units.push((
                EdgeKey::new(&producer.service_name, &consumer.service_name),
                produce_edge(
                    registered,
                    producer,
                    producer_deploy,
                    event_config,
                    consumer,
                    consumer_deploy,
                ),
            ));
        }
    }

    settle(Phase::ProduceEvents, units).await
}

async fn produce_edge(
    registered: &RegisteredDeployer,
    producer: &ServiceContext,
    producer_deploy: &DeployContext,
    event_config: &EventConsumerConfig,
    consumer: &ServiceContext,
    consumer_deploy: &DeployContext,
) -> Result<ProduceEventsContext> {
    debug!(
        producer = %producer.service_name,
        consumer = %consumer.service_name,
        "Producing events"
    );
    let context = registered
        .deployer()
        .produce_events(producer, producer_deploy, event_config, consumer, consumer_deploy)
        .await
        .map_err(|e| deployer_failure(producer, Phase::ProduceEvents, e))?;
    expect_edge(producer, consumer, Phase::ProduceEvents, context)
}
