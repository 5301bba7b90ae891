use super::{ConsumeEventsContexts, DeployContexts, deployer_failure, expect_edge, require, settle};
use crate::deployer::Phase;
use crate::error::{DeployError, Result};
use crate::registry::{RegisteredDeployer, ServiceRegistry};
use phaseflow_core::{
    ConsumeEventsContext, CoreError, DeployContext, EdgeKey, Environment, EventConsumerConfig,
    ServiceContext,
};
use tracing::{debug, info, instrument};

/// Wire every declared event route on the consumer side
///
/// Runs after every level is deployed. The consumer's deployer must declare
/// `consume_events`; results are keyed `consumer->producer`.
#[instrument(skip_all, fields(environment = %environment.environment_name))]
pub async fn consume_events(
    environment: &Environment,
    registry: &ServiceRegistry,
    deploy_contexts: &DeployContexts,
) -> Result<ConsumeEventsContexts> {
    info!("Executing consume_events phase");

    let mut units = Vec::new();
    for producer in environment.services() {
        for event_config in producer.event_consumers() {
            let consumer = environment
                .service(&event_config.service_name)
                .ok_or_else(|| CoreError::InvalidEventConsumer {
                    service: producer.service_name.clone(),
                    consumer: event_config.service_name.clone(),
                })?;
            let registered = registry.resolve_type(&consumer.service_type)?;
            if !registered.capabilities().supports(Phase::ConsumeEvents) {
                return Err(DeployError::contract(
                    consumer,
                    Phase::ConsumeEvents,
                    format!(
                        "service '{}' sends it events but the deployer does not consume events",
                        producer.service_name
                    ),
                ));
            }

            let consumer_deploy =
                require(deploy_contexts, &consumer.service_name, Phase::Deploy)?;
            let producer_deploy =
                require(deploy_contexts, &producer.service_name, Phase::Deploy)?;
            units.push((
                EdgeKey::new(&consumer.service_name, &producer.service_name),
                consume_edge(
                    registered,
                    consumer,
                    consumer_deploy,
                    event_config,
                    producer,
                    producer_deploy,
                ),
            ));
        }
    }

    settle(Phase::ConsumeEvents, units).await
}

async fn consume_edge(
    registered: &RegisteredDeployer,
    consumer: &ServiceContext,
    consumer_deploy: &DeployContext,
    event_config: &EventConsumerConfig,
    producer: &ServiceContext,
    producer_deploy: &DeployContext,
) -> Result<ConsumeEventsContext> {
    debug!(
        consumer = %consumer.service_name,
        producer = %producer.service_name,
        "Consuming events"
    );
    let context = registered
        .deployer()
        .consume_events(consumer, consumer_deploy, event_config, producer, producer_deploy)
        .await
        .map_err(|e| deployer_failure(consumer, Phase::ConsumeEvents, e))?;
    expect_edge(consumer, producer, Phase::ConsumeEvents, context)
}
