pub mod check;
pub mod delete;
pub mod deploy;
pub mod order;
pub mod types;

use crate::Source;
use crate::builtin::BuiltinServices;
use colored::Colorize;
use phaseflow_config::{EnvironmentFile, default_account_config_path, load_account_config};
use phaseflow_core::{AccountConfig, DEFAULT_PREFIX, Environment};
use phaseflow_deploy::ServiceRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolve and load the environment file, rejecting invalid files
pub fn load_file(source: &Source) -> anyhow::Result<(PathBuf, EnvironmentFile)> {
    let path = match &source.file {
        Some(path) => path.clone(),
        None => phaseflow_config::find_environment_file()?,
    };
    println!("Environment file: {}", path.display().to_string().cyan());
    let file = EnvironmentFile::load_valid(&path)?;
    Ok((path, file))
}

/// Load the account config from the argument or the per-user default
pub fn load_account(source: &Source) -> anyhow::Result<Arc<AccountConfig>> {
    let param = match &source.account_config {
        Some(param) => param.clone(),
        None => default_account_config_path()
            .map(|p| p.display().to_string())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No account config given: pass --account-config or set PHASEFLOW_ACCOUNT_CONFIG"
                )
            })?,
    };
    Ok(Arc::new(load_account_config(&param)?))
}

/// Registry with every extension this binary ships
pub fn registry() -> anyhow::Result<ServiceRegistry> {
    let mut registry = ServiceRegistry::new();
    registry.load_extension(DEFAULT_PREFIX, &BuiltinServices)?;
    Ok(registry)
}

pub fn build_environments(
    file: &EnvironmentFile,
    names: &[String],
    account: &Arc<AccountConfig>,
) -> anyhow::Result<Vec<Environment>> {
    let environments = names
        .iter()
        .map(|name| file.environment(name, account.clone()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(environments)
}
