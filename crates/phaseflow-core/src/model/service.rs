use super::{AccountConfig, ServiceType, Tags};
use crate::tagging;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One `event_consumers` entry of a producing service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventConsumerConfig {
    /// Name of the consuming service in the same environment
    pub service_name: String,

    /// Producer-specific settings for this event route
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl EventConsumerConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            params: serde_json::Map::new(),
        }
    }
}

/// Declared configuration of a service
///
/// Only the envelope fields are understood here; everything else lands in
/// `params` and belongs to the deployer of the service type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service type as written (`name` or `prefix::name`)
    #[serde(rename = "type")]
    pub service_type: String,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub tags: Tags,

    #[serde(default)]
    pub event_consumers: Vec<EventConsumerConfig>,

    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl ServiceConfig {
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            ..Default::default()
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_event_consumer(mut self, service_name: impl Into<String>) -> Self {
        self.event_consumers
            .push(EventConsumerConfig::new(service_name));
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a deployer-specific parameter as a specific type
    pub fn get_param<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.params
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Identity fields carried by every context a phase produces
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceIdentity {
    pub app_name: String,
    pub environment_name: String,
    pub service_name: String,
    pub service_type: ServiceType,
}

/// A service as seen by every phase of a run
///
/// Built once while the environment is assembled and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceContext {
    pub app_name: String,
    pub environment_name: String,
    pub service_name: String,
    pub service_type: ServiceType,

    /// Declared configuration
    pub params: ServiceConfig,

    /// Account settings shared across the environment
    pub account_config: Arc<AccountConfig>,

    /// Application-level tags
    pub tags: Tags,
}

impl ServiceContext {
    pub fn new(
        app_name: impl Into<String>,
        environment_name: impl Into<String>,
        service_name: impl Into<String>,
        service_type: ServiceType,
        params: ServiceConfig,
        account_config: Arc<AccountConfig>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            environment_name: environment_name.into(),
            service_name: service_name.into(),
            service_type,
            params,
            account_config,
            tags: Tags::new(),
        }
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn identity(&self) -> ServiceIdentity {
        ServiceIdentity {
            app_name: self.app_name.clone(),
            environment_name: self.environment_name.clone(),
            service_name: self.service_name.clone(),
            service_type: self.service_type.clone(),
        }
    }

    pub fn dependencies(&self) -> &[String] {
        &self.params.dependencies
    }

    pub fn depends_on(&self, service_name: &str) -> bool {
        self.params.dependencies.iter().any(|d| d == service_name)
    }

    pub fn event_consumers(&self) -> &[EventConsumerConfig] {
        &self.params.event_consumers
    }

    /// Tags to apply to this service's resources
    pub fn effective_tags(&self) -> Tags {
        tagging::effective_tags(self)
    }
}
