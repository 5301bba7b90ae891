//! Deployer registry
//!
//! Maps `(prefix, type)` pairs to deployers. A registry is built once per run
//! and handed to every phase; there is no process-wide instance.

use crate::deployer::{Capabilities, DeployerInfo, ServiceDeployer};
use crate::error::{DeployError, Result};
use phaseflow_core::{DEFAULT_PREFIX, ServiceType};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A deployer together with the metadata read from it at registration
#[derive(Clone)]
pub struct RegisteredDeployer {
    deployer: Arc<dyn ServiceDeployer>,
    capabilities: Capabilities,
    info: DeployerInfo,
}

impl RegisteredDeployer {
    fn new(deployer: Arc<dyn ServiceDeployer>) -> Self {
        let capabilities = deployer.capabilities();
        let info = deployer.info();
        Self {
            deployer,
            capabilities,
            info,
        }
    }

    pub fn deployer(&self) -> &dyn ServiceDeployer {
        self.deployer.as_ref()
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn info(&self) -> &DeployerInfo {
        &self.info
    }
}

impl std::fmt::Debug for RegisteredDeployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredDeployer")
            .field("capabilities", &self.capabilities)
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Dispatch table from service type to deployer
#[derive(Debug, Default, Clone)]
pub struct ServiceRegistry {
    prefixes: BTreeMap<String, BTreeMap<String, RegisteredDeployer>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deployer for `prefix::type_name`
    pub fn register(
        &mut self,
        prefix: &str,
        type_name: &str,
        deployer: Arc<dyn ServiceDeployer>,
    ) -> Result<()> {
        let types = self.prefixes.entry(prefix.to_string()).or_default();
        if types.contains_key(type_name) {
            return Err(DeployError::DuplicateServiceType(ServiceType::new(
                prefix, type_name,
            )));
        }

        let registered = RegisteredDeployer::new(deployer);
        debug!(
            prefix = %prefix,
            service_type = %type_name,
            capabilities = ?registered.capabilities,
            "Registered deployer"
        );
        types.insert(type_name.to_string(), registered);
        Ok(())
    }

    /// Look up the deployer for `prefix::type_name`
    pub fn resolve(&self, prefix: &str, type_name: &str) -> Result<&RegisteredDeployer> {
        self.prefixes
            .get(prefix)
            .and_then(|types| types.get(type_name))
            .ok_or_else(|| DeployError::UnknownServiceType(ServiceType::new(prefix, type_name)))
    }

    /// Look up a type under the built-in prefix
    pub fn resolve_default(&self, type_name: &str) -> Result<&RegisteredDeployer> {
        self.resolve(DEFAULT_PREFIX, type_name)
    }

    pub fn resolve_type(&self, service_type: &ServiceType) -> Result<&RegisteredDeployer> {
        self.resolve(&service_type.prefix, &service_type.name)
    }

    pub fn has_service(&self, service_type: &ServiceType) -> bool {
        self.resolve_type(service_type).is_ok()
    }

    /// Registered prefixes, in name order
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.prefixes.keys().map(String::as_str)
    }

    /// Every registered service type, in `(prefix, name)` order
    pub fn service_types(&self) -> Vec<ServiceType> {
        self.prefixes
            .iter()
            .flat_map(|(prefix, types)| {
                types
                    .keys()
                    .map(move |name| ServiceType::new(prefix.clone(), name.clone()))
            })
            .collect()
    }

    /// Let an extension register its deployers under `prefix`
    ///
    /// A prefix can only be loaded once.
    pub fn load_extension(&mut self, prefix: &str, extension: &dyn Extension) -> Result<()> {
        if self.prefixes.contains_key(prefix) {
            return Err(DeployError::DuplicateExtension(prefix.to_string()));
        }

        let mut context = ExtensionContext {
            prefix: prefix.to_string(),
            registry: self,
        };
        if let Err(source) = extension.load(&mut context) {
            // Keep a half-loaded prefix out of the registry
            self.prefixes.remove(prefix);
            return Err(DeployError::ExtensionLoad {
                prefix: prefix.to_string(),
                source,
            });
        }

        info!(prefix = %prefix, "Loaded extension");
        Ok(())
    }
}

/// A bundle of deployers registered under one prefix
pub trait Extension: Send + Sync {
    fn load(&self, context: &mut ExtensionContext<'_>) -> anyhow::Result<()>;
}

/// Registration handle given to [`Extension::load`]
pub struct ExtensionContext<'a> {
    prefix: String,
    registry: &'a mut ServiceRegistry,
}

impl ExtensionContext<'_> {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register `deployer` for `<prefix>::<type_name>`
    pub fn service(
        &mut self,
        type_name: &str,
        deployer: impl ServiceDeployer + 'static,
    ) -> Result<&mut Self> {
        self.registry
            .register(&self.prefix, type_name, Arc::new(deployer))?;
        Ok(self)
    }
}
