use crate::deployer::Phase;
use crate::error::Result;
use crate::registry::{RegisteredDeployer, ServiceRegistry};
use phaseflow_core::{Environment, ServiceContext, missing_required_tags};
use tracing::{debug, info, instrument};

/// Validate every service of the environment
///
/// Collects deployer `check` output, missing required tags and registry
/// compatibility problems for all services; never stops at the first one.
/// Only a service type missing from the registry is fatal.
#[instrument(skip_all, fields(environment = %environment.environment_name))]
pub fn check_services(environment: &Environment, registry: &ServiceRegistry) -> Result<Vec<String>> {
    info!("Executing check phase");

    let required_tags = &environment.account_config.required_tags;
    let mut errors = Vec::new();

    for service in environment.services() {
        let registered = registry.resolve_type(&service.service_type)?;
        let dependencies = environment.dependencies_of(service)?;

        let mut service_errors = Vec::new();
        if registered.capabilities().supports(Phase::Check) {
            service_errors.extend(registered.deployer().check(service, &dependencies));
        }
        if registered.info().supports_tagging {
            service_errors.extend(missing_required_tags(service, required_tags));
        }
        service_errors.extend(check_consumability(service, registered, &dependencies, registry)?);
        service_errors.extend(check_event_consumers(environment, service, registered, registry)?);

        debug!(
            service = %service.service_name,
            errors = service_errors.len(),
            "Checked service"
        );
        errors.extend(
            service_errors
                .into_iter()
                .map(|e| format!("Service '{}' - {}", service.service_name, e)),
        );
    }

    Ok(errors)
}

/// Every dependency must produce outputs this service knows how to consume
fn check_consumability(
    service: &ServiceContext,
    registered: &RegisteredDeployer,
    dependencies: &[&ServiceContext],
    registry: &ServiceRegistry,
) -> Result<Vec<String>> {
    let consumed = &registered.info().consumed_deploy_output_types;
    let mut errors = Vec::new();

    for dependency in dependencies {
        let produced = &registry
            .resolve_type(&dependency.service_type)?
            .info()
            .produced_deploy_output_types;
        if produced.is_empty() || !produced.iter().all(|output| consumed.contains(output)) {
            errors.push(format!(
                "The '{}' service type is not consumable by the '{}' service type",
                dependency.service_type, service.service_type
            ));
        }
    }

    Ok(errors)
}

/// Every event consumer must accept the events this service produces
fn check_event_consumers(
    environment: &Environment,
    producer: &ServiceContext,
    registered: &RegisteredDeployer,
    registry: &ServiceRegistry,
) -> Result<Vec<String>> {
    let supported = &registered.info().produced_events_supported_types;
    let mut errors = Vec::new();

    for consumer_config in producer.event_consumers() {
        // Unknown consumers are rejected before check runs
        let Some(consumer) = environment.service(&consumer_config.service_name) else {
            continue;
        };
        let consumer_info = registry.resolve_type(&consumer.service_type)?.info();
        let compatible = consumer_info
            .provided_event_type
            .as_ref()
            .is_some_and(|event_type| supported.contains(event_type));
        if !compatible {
            errors.push(format!(
                "The '{}' service type can't consume events from the '{}' service type",
                consumer.service_type, producer.service_type
            ));
        }
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployer::{Capabilities, DeployerInfo, ServiceDeployer};
    use crate::error::DeployError;
    use crate::phases::testing::environment;
    use phaseflow_core::{AccountConfig, DeployOutputType, ServiceConfig, ServiceType};
    use std::sync::Arc;

    struct Fake {
        info: DeployerInfo,
        errors: Vec<String>,
    }

    impl ServiceDeployer for Fake {
        fn info(&self) -> DeployerInfo {
            self.info.clone()
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::none().with(Phase::Check)
        }

        fn check(&self, _own: &ServiceContext, _deps: &[&ServiceContext]) -> Vec<String> {
            self.errors.clone()
        }
    }

    fn registry() -> ServiceRegistry {
        let mut registry = ServiceRegistry::new();
        let env_vars = DeployerInfo {
            produced_deploy_output_types: vec![DeployOutputType::EnvironmentVariables],
            consumed_deploy_output_types: vec![DeployOutputType::EnvironmentVariables],
            produced_events_supported_types: vec!["function".into()],
            ..Default::default()
        };
        registry
            .register(
                "builtin",
                "kv",
                Arc::new(Fake {
                    info: env_vars,
                    errors: vec![],
                }),
            )
            .unwrap();
        registry
            .register(
                "builtin",
                "fn",
                Arc::new(Fake {
                    info: DeployerInfo {
                        provided_event_type: Some("function".into()),
                        consumed_deploy_output_types: vec![DeployOutputType::EnvironmentVariables],
                        ..Default::default()
                    },
                    errors: vec![],
                }),
            )
            .unwrap();
        registry
            .register(
                "builtin",
                "bad",
                Arc::new(Fake {
                    info: DeployerInfo {
                        supports_tagging: false,
                        ..Default::default()
                    },
                    errors: vec!["'size' parameter is required".into()],
                }),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_clean_environment_has_no_errors() {
        let env = environment(&[("api", "fn", &["db"]), ("db", "kv", &[])]);
        assert!(check_services(&env, &registry()).unwrap().is_empty());
    }

    #[test]
    fn test_errors_are_aggregated_and_prefixed() {
        let env = environment(&[("x", "bad", &[]), ("y", "bad", &[])]);
        let errors = check_services(&env, &registry()).unwrap();
        assert_eq!(
            errors,
            vec![
                "Service 'x' - 'size' parameter is required",
                "Service 'y' - 'size' parameter is required",
            ]
        );
    }

    #[test]
    fn test_dependency_must_be_consumable() {
        // `bad` produces nothing
        let env = environment(&[("api", "fn", &["x"]), ("x", "bad", &[])]);
        let errors = check_services(&env, &registry()).unwrap();
        assert!(errors.contains(
            &"Service 'api' - The 'bad' service type is not consumable by the 'fn' service type"
                .to_string()
        ));
    }

    #[test]
    fn test_event_consumer_compatibility() {
        let account = Arc::new(AccountConfig::new("1", "us-west-2"));
        let mut env = Environment::new("shop", "dev", account.clone());
        let producer = ServiceConfig::new("kv").with_event_consumer("handler");
        env.add_service(ServiceContext::new(
            "shop", "dev", "table", ServiceType::builtin("kv"), producer, account.clone(),
        ))
        .unwrap();
        env.add_service(ServiceContext::new(
            "shop", "dev", "handler", ServiceType::builtin("fn"), ServiceConfig::new("fn"), account.clone(),
        ))
        .unwrap();
        assert!(check_services(&env, &registry()).unwrap().is_empty());

        let mut env = Environment::new("shop", "dev", account.clone());
        let producer = ServiceConfig::new("kv").with_event_consumer("other");
        env.add_service(ServiceContext::new(
            "shop", "dev", "table", ServiceType::builtin("kv"), producer, account.clone(),
        ))
        .unwrap();
        env.add_service(ServiceContext::new(
            "shop", "dev", "other", ServiceType::builtin("kv"), ServiceConfig::new("kv"), account,
        ))
        .unwrap();
        let errors = check_services(&env, &registry()).unwrap();
        assert_eq!(
            errors,
            vec!["Service 'table' - The 'kv' service type can't consume events from the 'kv' service type"]
        );
    }

    #[test]
    fn test_required_tags_respect_supports_tagging() {
        let account = Arc::new(AccountConfig::new("1", "us-west-2").with_required_tags(["team"]));
        let mut env = Environment::new("shop", "dev", account.clone());
        for (name, ty) in [("db", "kv"), ("x", "bad")] {
            env.add_service(ServiceContext::new(
                "shop", "dev", name, ServiceType::builtin(ty), ServiceConfig::new(ty), account.clone(),
            ))
            .unwrap();
        }

        let errors = check_services(&env, &registry()).unwrap();
        assert!(errors.contains(&"Service 'db' - Tagging - db - Missing required tag 'team'. You can apply this tag at either the application or service level.".to_string()));
        assert!(!errors.iter().any(|e| e.contains("Tagging - x")));
    }

    #[test]
    fn test_unknown_service_type_is_fatal() {
        let env = environment(&[("q", "acme::queue", &[])]);
        let err = check_services(&env, &registry()).unwrap_err();
        assert!(matches!(err, DeployError::UnknownServiceType(_)));
    }
}
