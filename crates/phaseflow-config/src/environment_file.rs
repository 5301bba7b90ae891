//! Environment file
//!
//! ```yaml
//! version: 1
//! name: shop
//! tags:
//!   team: infra
//! environments:
//!   dev:
//!     table:
//!       type: kv
//!     api:
//!       type: acme::function
//!       dependencies: [table]
//! ```

use crate::error::{ConfigError, Result};
use phaseflow_core::{
    AccountConfig, Environment, ServiceConfig, ServiceContext, ServiceType, Tags,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::{debug, instrument};

/// Only supported file version
pub const SUPPORTED_VERSION: u32 = 1;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9-]+$").expect("valid name pattern"));

/// Services of one environment, keyed by service name
pub type EnvironmentSpec = BTreeMap<String, ServiceConfig>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentFile {
    pub version: u32,

    /// Application name
    pub name: String,

    /// Application-level tags
    #[serde(default)]
    pub tags: Tags,

    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentSpec>,
}

impl EnvironmentFile {
    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(app = %file.name, environments = file.environments.len(), "Loaded environment file");
        Ok(file)
    }

    /// Load and reject a file with any validation error
    pub fn load_valid(path: &Path) -> Result<Self> {
        let file = Self::load(path)?;
        let errors = file.validate();
        if !errors.is_empty() {
            return Err(ConfigError::InvalidEnvironmentFile { errors });
        }
        Ok(file)
    }

    /// Validate the file, collecting every problem
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.version != SUPPORTED_VERSION {
            errors.push(format!(
                "Unsupported version '{}', expected {}",
                self.version, SUPPORTED_VERSION
            ));
        }
        if !NAME_PATTERN.is_match(&self.name) {
            errors.push(format!(
                "Invalid app name '{}': only letters, numbers and '-' are allowed",
                self.name
            ));
        }
        if self.environments.is_empty() {
            errors.push("At least one environment must be defined".to_string());
        }

        for (env_name, services) in &self.environments {
            if !NAME_PATTERN.is_match(env_name) {
                errors.push(format!(
                    "Invalid environment name '{env_name}': only letters, numbers and '-' are allowed"
                ));
            }
            for (service_name, service) in services {
                errors.extend(validate_service(services, service_name, service));
            }
        }

        errors
    }

    pub fn environment_names(&self) -> impl Iterator<Item = &str> {
        self.environments.keys().map(String::as_str)
    }

    /// Build the environment `name` with the given account settings
    pub fn environment(&self, name: &str, account: Arc<AccountConfig>) -> Result<Environment> {
        let spec = self
            .environments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnvironment(name.to_string()))?;

        let mut environment =
            Environment::new(&self.name, name, account.clone()).with_tags(self.tags.clone());
        for (service_name, config) in spec {
            let service_type: ServiceType = config.service_type.parse()?;
            let service = ServiceContext::new(
                &self.name,
                name,
                service_name,
                service_type,
                config.clone(),
                account.clone(),
            )
            .with_tags(self.tags.clone());
            environment.add_service(service)?;
        }

        Ok(environment)
    }
}

fn validate_service(
    services: &EnvironmentSpec,
    service_name: &str,
    service: &ServiceConfig,
) -> Vec<String> {
    let mut errors = Vec::new();

    if !NAME_PATTERN.is_match(service_name) {
        errors.push(format!(
            "Invalid service name '{service_name}': only letters, numbers and '-' are allowed"
        ));
    }
    if let Err(err) = service.service_type.parse::<ServiceType>() {
        errors.push(format!("Service '{service_name}': {err}"));
    }
    let mut seen = BTreeSet::new();
    for dependency in &service.dependencies {
        if !seen.insert(dependency.as_str()) {
            errors.push(format!(
                "You declared the dependency '{dependency}' more than once in the service '{service_name}'"
            ));
        } else if !services.contains_key(dependency) {
            errors.push(format!(
                "You declared a dependency '{dependency}' in the service '{service_name}' that doesn't exist"
            ));
        }
    }
    let mut seen = BTreeSet::new();
    for consumer in &service.event_consumers {
        if !seen.insert(consumer.service_name.as_str()) {
            errors.push(format!(
                "You declared the event consumer '{}' more than once in the service '{service_name}'",
                consumer.service_name
            ));
        } else if !services.contains_key(&consumer.service_name) {
            errors.push(format!(
                "You declared an event consumer '{}' in the service '{service_name}' that doesn't exist",
                consumer.service_name
            ));
        }
    }

    errors
}
