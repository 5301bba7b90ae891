//! Typed results of each lifecycle phase
//!
//! Every context carries the identity of the service(s) it was produced for.
//! The `new` constructors build the canonical empty context used when a
//! deployer does not take part in a phase.

use super::{ServiceContext, ServiceIdentity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kinds of output a deployer hands to the services depending on it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployOutputType {
    EnvironmentVariables,
    Policies,
    Scripts,
    SecurityGroups,
}

impl fmt::Display for DeployOutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployOutputType::EnvironmentVariables => write!(f, "environment_variables"),
            DeployOutputType::Policies => write!(f, "policies"),
            DeployOutputType::Scripts => write!(f, "scripts"),
            DeployOutputType::SecurityGroups => write!(f, "security_groups"),
        }
    }
}

/// Key of an edge-oriented phase result, rendered as `from->to`
///
/// Bind/UnBind use `dependent->dependency`, ConsumeEvents uses
/// `consumer->producer` and ProduceEvents uses `producer->consumer`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: String,
    pub to: String,
}

impl EdgeKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Context produced for exactly one service
pub trait ServicePhaseContext {
    fn identity(&self) -> &ServiceIdentity;
}

/// Context produced for a pair of services
///
/// `owner` is the service whose deployer was invoked, `peer` the other side.
pub trait EdgePhaseContext {
    fn owner(&self) -> &ServiceIdentity;
    fn peer(&self) -> &ServiceIdentity;
}

/// Upper-cased `<service>_<suffix>` with every non-alphanumeric character as `_`
pub fn injected_env_var_name(service_name: &str, suffix: &str) -> String {
    format!("{}_{}", service_name, suffix)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// A security group created for a service before deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub group_id: String,
    pub group_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreDeployContext {
    pub identity: ServiceIdentity,
    pub security_groups: Vec<SecurityGroup>,
}

impl PreDeployContext {
    pub fn new(service: &ServiceContext) -> Self {
        Self {
            identity: service.identity(),
            security_groups: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindContext {
    pub dependency: ServiceIdentity,
    pub dependent: ServiceIdentity,
}

impl BindContext {
    pub fn new(dependency: &ServiceContext, dependent: &ServiceContext) -> Self {
        Self {
            dependency: dependency.identity(),
            dependent: dependent.identity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployContext {
    pub identity: ServiceIdentity,

    /// Policy documents dependents may attach to their own roles
    pub policies: Vec<serde_json::Value>,

    /// Variables injected into dependents, keyed by namespaced name
    pub environment_variables: BTreeMap<String, String>,

    /// Startup scripts dependents should run
    pub scripts: Vec<String>,

    /// Outputs used by the event phases
    pub event_outputs: serde_json::Map<String, serde_json::Value>,
}

impl DeployContext {
    pub fn new(service: &ServiceContext) -> Self {
        Self {
            identity: service.identity(),
            policies: Vec::new(),
            environment_variables: BTreeMap::new(),
            scripts: Vec::new(),
            event_outputs: serde_json::Map::new(),
        }
    }

    /// Insert a variable under this service's namespace, returning the full key
    pub fn add_environment_variable(
        &mut self,
        suffix: &str,
        value: impl Into<String>,
    ) -> String {
        let key = injected_env_var_name(&self.identity.service_name, suffix);
        self.environment_variables.insert(key.clone(), value.into());
        key
    }

    pub fn service_name(&self) -> &str {
        &self.identity.service_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumeEventsContext {
    pub consumer: ServiceIdentity,
    pub producer: ServiceIdentity,
}

impl ConsumeEventsContext {
    pub fn new(consumer: &ServiceContext, producer: &ServiceContext) -> Self {
        Self {
            consumer: consumer.identity(),
            producer: producer.identity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProduceEventsContext {
    pub producer: ServiceIdentity,
    pub consumer: ServiceIdentity,
}

impl ProduceEventsContext {
    pub fn new(producer: &ServiceContext, consumer: &ServiceContext) -> Self {
        Self {
            producer: producer.identity(),
            consumer: consumer.identity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnBindContext {
    pub dependency: ServiceIdentity,
    pub dependent: ServiceIdentity,
}

impl UnBindContext {
    pub fn new(dependency: &ServiceContext, dependent: &ServiceContext) -> Self {
        Self {
            dependency: dependency.identity(),
            dependent: dependent.identity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnDeployContext {
    pub identity: ServiceIdentity,
}

impl UnDeployContext {
    pub fn new(service: &ServiceContext) -> Self {
        Self {
            identity: service.identity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnPreDeployContext {
    pub identity: ServiceIdentity,
}

impl UnPreDeployContext {
    pub fn new(service: &ServiceContext) -> Self {
        Self {
            identity: service.identity(),
        }
    }
}

macro_rules! service_scoped {
    ($($ty:ty),*) => {
        $(impl ServicePhaseContext for $ty {
            fn identity(&self) -> &ServiceIdentity {
                &self.identity
            }
        })*
    };
}

service_scoped!(PreDeployContext, DeployContext, UnDeployContext, UnPreDeployContext);

macro_rules! edge_scoped {
    ($($ty:ty => ($owner:ident, $peer:ident)),*) => {
        $(impl EdgePhaseContext for $ty {
            fn owner(&self) -> &ServiceIdentity {
                &self.$owner
            }

            fn peer(&self) -> &ServiceIdentity {
                &self.$peer
            }
        })*
    };
}

edge_scoped!(
    BindContext => (dependency, dependent),
    UnBindContext => (dependency, dependent),
    ConsumeEventsContext => (consumer, producer),
    ProduceEventsContext => (producer, consumer)
);
