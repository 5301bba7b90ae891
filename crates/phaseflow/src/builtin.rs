//! Deployers shipped with the binary, registered under the default prefix
//!
//! Both work on the local machine only, so an environment file can be tried
//! end to end without any provider extension.

use async_trait::async_trait;
use phaseflow_core::{
    DeployContext, DeployOutputType, PreDeployContext, ServiceContext, UnDeployContext,
};
use phaseflow_deploy::{
    Capabilities, DeployerInfo, Extension, ExtensionContext, Phase, ServiceDeployer,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

pub struct BuiltinServices;

impl Extension for BuiltinServices {
    fn load(&self, context: &mut ExtensionContext<'_>) -> anyhow::Result<()> {
        context
            .service("parameters", ParametersDeployer)?
            .service("dotenv", DotenvDeployer)?;
        Ok(())
    }
}

fn scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Publishes its `values` map as environment variables for dependents
pub struct ParametersDeployer;

impl ParametersDeployer {
    fn values(service: &ServiceContext) -> Option<&serde_json::Map<String, serde_json::Value>> {
        service.params.params.get("values")?.as_object()
    }
}

#[async_trait]
impl ServiceDeployer for ParametersDeployer {
    fn info(&self) -> DeployerInfo {
        DeployerInfo {
            produced_deploy_output_types: vec![DeployOutputType::EnvironmentVariables],
            supports_tagging: false,
            ..Default::default()
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none().with(Phase::Check).with(Phase::Deploy)
    }

    fn check(&self, own: &ServiceContext, _dependencies: &[&ServiceContext]) -> Vec<String> {
        let Some(values) = Self::values(own) else {
            return vec!["The 'values' parameter is required and must be a map".to_string()];
        };
        values
            .iter()
            .filter(|(_, value)| scalar_to_string(value).is_none())
            .map(|(key, _)| format!("Value '{key}' must be a string, number or boolean"))
            .collect()
    }

    async fn deploy(
        &self,
        own: &ServiceContext,
        _own_pre_deploy: &PreDeployContext,
        _dependencies: &[&DeployContext],
    ) -> anyhow::Result<DeployContext> {
        let mut context = DeployContext::new(own);
        for (key, value) in Self::values(own).into_iter().flatten() {
            let value = scalar_to_string(value)
                .ok_or_else(|| anyhow::anyhow!("value '{}' is not a scalar", key))?;
            let name = context.add_environment_variable(key, value);
            debug!(service = %own.service_name, variable = %name, "Published parameter");
        }
        Ok(context)
    }
}

/// Writes the variables of its dependencies to a dotenv file
pub struct DotenvDeployer;

impl DotenvDeployer {
    fn path(service: &ServiceContext) -> Option<PathBuf> {
        service.params.get_param::<String>("path").map(PathBuf::from)
    }

    fn render(dependencies: &[&DeployContext]) -> String {
        let merged: BTreeMap<&str, &str> = dependencies
            .iter()
            .flat_map(|d| d.environment_variables.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        merged
            .into_iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect()
    }
}

#[async_trait]
impl ServiceDeployer for DotenvDeployer {
    fn info(&self) -> DeployerInfo {
        DeployerInfo {
            consumed_deploy_output_types: vec![DeployOutputType::EnvironmentVariables],
            supports_tagging: false,
            ..Default::default()
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
            .with(Phase::Check)
            .with(Phase::Deploy)
            .with(Phase::UnDeploy)
    }

    fn check(&self, own: &ServiceContext, _dependencies: &[&ServiceContext]) -> Vec<String> {
        match Self::path(own) {
            Some(path) if !path.as_os_str().is_empty() => Vec::new(),
            _ => vec!["The 'path' parameter is required".to_string()],
        }
    }

    async fn deploy(
        &self,
        own: &ServiceContext,
        _own_pre_deploy: &PreDeployContext,
        dependencies: &[&DeployContext],
    ) -> anyhow::Result<DeployContext> {
        let path = Self::path(own).ok_or_else(|| anyhow::anyhow!("'path' is not set"))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, Self::render(dependencies)).await?;
        info!(service = %own.service_name, path = %path.display(), "Wrote dotenv file");
        Ok(DeployContext::new(own))
    }

    async fn un_deploy(&self, own: &ServiceContext) -> anyhow::Result<UnDeployContext> {
        let path = Self::path(own).ok_or_else(|| anyhow::anyhow!("'path' is not set"))?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!(service = %own.service_name, path = %path.display(), "Removed dotenv file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Dotenv file already gone");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(UnDeployContext::new(own))
    }
}
