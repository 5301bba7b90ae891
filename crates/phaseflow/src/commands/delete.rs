use crate::Source;
use colored::Colorize;
use phaseflow_deploy::delete_environment;

pub async fn handle(source: &Source, environment: &str, yes: bool) -> anyhow::Result<()> {
    println!("{}", "Deleting environment...".yellow());
    let (_, file) = super::load_file(source)?;
    let account = super::load_account(source)?;
    let registry = super::registry()?;

    let environment = file.environment(environment, account)?;
    println!(
        "{}",
        format!(
            "Services of '{}' ({}):",
            environment.environment_name,
            environment.len()
        )
        .bold()
    );
    for name in environment.service_names() {
        println!("  • {}", name.cyan());
    }

    if !yes {
        println!();
        println!(
            "{}",
            "Warning: every service of this environment will be removed.".yellow()
        );
        anyhow::bail!(
            "Refusing to delete '{}' without --yes",
            environment.environment_name
        );
    }

    let result = delete_environment(&environment, &registry).await;
    println!();
    if !result.is_success() {
        anyhow::bail!("{}", result.message);
    }
    println!("{}", "✓ Environment deleted".green().bold());
    Ok(())
}
