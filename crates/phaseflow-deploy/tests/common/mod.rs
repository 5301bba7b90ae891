//! Shared fixtures for the engine integration tests

#![allow(dead_code)]

use phaseflow_core::{
    AccountConfig, BindContext, ConsumeEventsContext, DeployContext, DeployOutputType,
    Environment, EventConsumerConfig, PreDeployContext, ProduceEventsContext, ServiceConfig,
    ServiceContext, UnBindContext, UnDeployContext, UnPreDeployContext,
};
use phaseflow_deploy::{
    Capabilities, DeployerInfo, Phase, ServiceDeployer, ServiceRegistry, async_trait,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded deployer call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub phase: Phase,
    pub service: String,
    /// Other services handed to the call (dependencies, dependent, peer)
    pub peers: Vec<String>,
}

/// Invocation log shared by every fake deployer of a test
#[derive(Debug, Default)]
pub struct Journal(Mutex<Vec<Call>>);

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn record(&self, phase: Phase, service: &str, peers: Vec<String>) {
        self.0.lock().unwrap().push(Call {
            phase,
            service: service.to_string(),
            peers,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    /// Services invoked for `phase`, in invocation order
    pub fn services(&self, phase: Phase) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.phase == phase)
            .map(|c| c.service)
            .collect()
    }

    /// Phase/service pairs, in invocation order
    pub fn sequence(&self) -> Vec<(Phase, String)> {
        self.calls()
            .into_iter()
            .map(|c| (c.phase, c.service))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().unwrap().is_empty()
    }
}

/// Deployer implementing every phase and recording each call
pub struct FakeDeployer {
    journal: Arc<Journal>,
    capabilities: Capabilities,
    info: DeployerInfo,
    check_errors: Vec<String>,
    failing: Vec<(Phase, String)>,
    delays: Vec<(String, u64)>,
}

impl FakeDeployer {
    pub fn new(journal: &Arc<Journal>) -> Self {
        Self {
            journal: journal.clone(),
            capabilities: Capabilities::all(),
            info: DeployerInfo {
                provided_event_type: Some("fake".into()),
                produced_events_supported_types: vec!["fake".into()],
                produced_deploy_output_types: vec![DeployOutputType::EnvironmentVariables],
                consumed_deploy_output_types: vec![DeployOutputType::EnvironmentVariables],
                supports_tagging: true,
            },
            check_errors: Vec::new(),
            failing: Vec::new(),
            delays: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_info(mut self, info: DeployerInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_check_errors(mut self, errors: &[&str]) -> Self {
        self.check_errors = errors.iter().map(|e| e.to_string()).collect();
        self
    }

    /// Fail `phase` when invoked for `service`
    pub fn failing(mut self, phase: Phase, service: &str) -> Self {
        self.failing.push((phase, service.to_string()));
        self
    }

    /// Delay every call made for `service`
    pub fn with_delay(mut self, service: &str, millis: u64) -> Self {
        self.delays.push((service.to_string(), millis));
        self
    }

    async fn enter(&self, phase: Phase, own: &ServiceContext, peers: Vec<String>) -> anyhow::Result<()> {
        if let Some((_, millis)) = self.delays.iter().find(|(s, _)| *s == own.service_name) {
            tokio::time::sleep(Duration::from_millis(*millis)).await;
        }
        self.journal.record(phase, &own.service_name, peers);
        if self
            .failing
            .iter()
            .any(|(p, s)| *p == phase && *s == own.service_name)
        {
            anyhow::bail!("provider rejected {} of '{}'", phase, own.service_name);
        }
        Ok(())
    }
}

#[async_trait]
impl ServiceDeployer for FakeDeployer {
    fn info(&self) -> DeployerInfo {
        self.info.clone()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn check(&self, own: &ServiceContext, dependencies: &[&ServiceContext]) -> Vec<String> {
        let peers = dependencies.iter().map(|d| d.service_name.clone()).collect();
        self.journal.record(Phase::Check, &own.service_name, peers);
        self.check_errors.clone()
    }

    async fn pre_deploy(&self, own: &ServiceContext) -> anyhow::Result<PreDeployContext> {
        self.enter(Phase::PreDeploy, own, vec![]).await?;
        Ok(PreDeployContext::new(own))
    }

    async fn bind(
        &self,
        own: &ServiceContext,
        _own_pre_deploy: &PreDeployContext,
        dependent: &ServiceContext,
        _dependent_pre_deploy: &PreDeployContext,
    ) -> anyhow::Result<BindContext> {
        self.enter(Phase::Bind, own, vec![dependent.service_name.clone()])
            .await?;
        Ok(BindContext::new(own, dependent))
    }

    async fn deploy(
        &self,
        own: &ServiceContext,
        _own_pre_deploy: &PreDeployContext,
        dependencies: &[&DeployContext],
    ) -> anyhow::Result<DeployContext> {
        let peers = dependencies
            .iter()
            .map(|d| d.service_name().to_string())
            .collect();
        self.enter(Phase::Deploy, own, peers).await?;

        let mut context = DeployContext::new(own);
        context.add_environment_variable("URL", format!("https://{}.internal", own.service_name));
        for dependency in dependencies {
            context
                .environment_variables
                .extend(dependency.environment_variables.clone());
        }
        Ok(context)
    }

    async fn consume_events(
        &self,
        own: &ServiceContext,
        _own_deploy: &DeployContext,
        _event_config: &EventConsumerConfig,
        producer: &ServiceContext,
        _producer_deploy: &DeployContext,
    ) -> anyhow::Result<ConsumeEventsContext> {
        self.enter(Phase::ConsumeEvents, own, vec![producer.service_name.clone()])
            .await?;
        Ok(ConsumeEventsContext::new(own, producer))
    }

    async fn produce_events(
        &self,
        own: &ServiceContext,
        _own_deploy: &DeployContext,
        _event_config: &EventConsumerConfig,
        consumer: &ServiceContext,
        _consumer_deploy: &DeployContext,
    ) -> anyhow::Result<ProduceEventsContext> {
        self.enter(Phase::ProduceEvents, own, vec![consumer.service_name.clone()])
            .await?;
        Ok(ProduceEventsContext::new(own, consumer))
    }

    async fn un_bind(
        &self,
        own: &ServiceContext,
        dependent: &ServiceContext,
    ) -> anyhow::Result<UnBindContext> {
        self.enter(Phase::UnBind, own, vec![dependent.service_name.clone()])
            .await?;
        Ok(UnBindContext::new(own, dependent))
    }

    async fn un_deploy(&self, own: &ServiceContext) -> anyhow::Result<UnDeployContext> {
        self.enter(Phase::UnDeploy, own, vec![]).await?;
        Ok(UnDeployContext::new(own))
    }

    async fn un_pre_deploy(&self, own: &ServiceContext) -> anyhow::Result<UnPreDeployContext> {
        self.enter(Phase::UnPreDeploy, own, vec![]).await?;
        Ok(UnPreDeployContext::new(own))
    }
}

pub fn account() -> Arc<AccountConfig> {
    Arc::new(AccountConfig::new("123456789012", "us-west-2"))
}

/// Environment `shop/dev` from `(service name, config)` pairs
pub fn environment_with(account: Arc<AccountConfig>, services: Vec<(&str, ServiceConfig)>) -> Environment {
    let mut env = Environment::new("shop", "dev", account.clone());
    for (name, config) in services {
        let service_type = config.service_type.parse().unwrap();
        env.add_service(ServiceContext::new(
            "shop",
            "dev",
            name,
            service_type,
            config,
            account.clone(),
        ))
        .unwrap();
    }
    env
}

/// Environment of `fake` services from `(name, dependencies)` pairs
pub fn environment(services: &[(&str, &[&str])]) -> Environment {
    environment_with(
        account(),
        services
            .iter()
            .map(|(name, deps)| {
                (
                    *name,
                    ServiceConfig::new("fake").with_dependencies(deps.iter().copied()),
                )
            })
            .collect(),
    )
}

/// Registry with `deployer` registered as the built-in `fake` type
pub fn registry(deployer: FakeDeployer) -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    registry
        .register("builtin", "fake", Arc::new(deployer))
        .unwrap();
    registry
}
