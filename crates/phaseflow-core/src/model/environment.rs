use super::{AccountConfig, ServiceContext, Tags};
use crate::error::{CoreError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A named set of services deployed together
///
/// Identified by `(app_name, environment_name)`. Services are keyed by name;
/// iteration is in name order so every phase walks services deterministically.
#[derive(Debug, Clone)]
pub struct Environment {
    pub app_name: String,
    pub environment_name: String,
    pub account_config: Arc<AccountConfig>,

    /// Application-level tags
    pub tags: Tags,

    services: BTreeMap<String, ServiceContext>,
}

impl Environment {
    pub fn new(
        app_name: impl Into<String>,
        environment_name: impl Into<String>,
        account_config: Arc<AccountConfig>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            environment_name: environment_name.into(),
            account_config,
            tags: Tags::new(),
            services: BTreeMap::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Add a service; names must be unique within the environment
    pub fn add_service(&mut self, service: ServiceContext) -> Result<()> {
        if self.services.contains_key(&service.service_name) {
            return Err(CoreError::DuplicateService(service.service_name));
        }
        self.services.insert(service.service_name.clone(), service);
        Ok(())
    }

    pub fn service(&self, name: &str) -> Option<&ServiceContext> {
        self.services.get(name)
    }

    /// Like [`Environment::service`], failing with `ServiceNotFound`
    pub fn require_service(&self, name: &str) -> Result<&ServiceContext> {
        self.service(name)
            .ok_or_else(|| CoreError::ServiceNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceContext> {
        self.services.values()
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Services that declare `name` as one of their dependencies
    pub fn dependents_of(&self, name: &str) -> Vec<&ServiceContext> {
        self.services.values().filter(|s| s.depends_on(name)).collect()
    }

    /// Resolved contexts of a service's direct dependencies
    pub fn dependencies_of(&self, service: &ServiceContext) -> Result<Vec<&ServiceContext>> {
        service
            .dependencies()
            .iter()
            .map(|dep| {
                self.service(dep).ok_or_else(|| CoreError::InvalidDependency {
                    service: service.service_name.clone(),
                    dependency: dep.clone(),
                })
            })
            .collect()
    }

    /// Check every `event_consumers` entry names a distinct service of this environment
    pub fn validate_event_consumers(&self) -> Result<()> {
        for service in self.services.values() {
            let mut seen = BTreeSet::new();
            for consumer in service.event_consumers() {
                if !seen.insert(consumer.service_name.as_str()) {
                    return Err(CoreError::DuplicateEventConsumer {
                        service: service.service_name.clone(),
                        consumer: consumer.service_name.clone(),
                    });
                }
                if !self.contains(&consumer.service_name) {
                    return Err(CoreError::InvalidEventConsumer {
                        service: service.service_name.clone(),
                        consumer: consumer.service_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
