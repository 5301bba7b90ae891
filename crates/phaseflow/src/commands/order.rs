use crate::Source;
use colored::Colorize;
use phaseflow_core::{AccountConfig, DeployOrder};
use std::sync::Arc;

/// Print the deploy levels of an environment
///
/// Planning needs no account settings, so a missing account config is fine.
pub fn handle(source: &Source, environment: &str) -> anyhow::Result<()> {
    let (_, file) = super::load_file(source)?;
    let account = match source.account_config {
        Some(_) => super::load_account(source)?,
        None => Arc::new(AccountConfig::default()),
    };

    let environment = file.environment(environment, account)?;
    let order = DeployOrder::plan(&environment)?;

    println!(
        "{}",
        format!("Deploy order for '{}':", environment.environment_name).bold()
    );
    for level in order.ascending() {
        let services = order.level(level).unwrap_or_default();
        println!("  Level {}: {}", level, services.join(", ").cyan());
    }
    Ok(())
}
