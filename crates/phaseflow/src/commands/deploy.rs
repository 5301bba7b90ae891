use crate::Source;
use colored::Colorize;
use phaseflow_deploy::deploy_environments;

pub async fn handle(source: &Source, environments: &[String]) -> anyhow::Result<()> {
    println!("{}", "Starting deploy...".blue().bold());
    let (_, file) = super::load_file(source)?;
    let account = super::load_account(source)?;
    let registry = super::registry()?;

    let environments = super::build_environments(&file, environments, &account)?;
    println!(
        "App: {}  Environments: {}",
        file.name.cyan(),
        environments
            .iter()
            .map(|e| e.environment_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let results = deploy_environments(&environments, &registry).await;

    println!();
    let mut failed = 0;
    for result in &results {
        let seconds = result.duration().num_milliseconds() as f64 / 1000.0;
        if result.is_success() {
            println!(
                "  {} {} ({:.1}s)",
                "✓".green(),
                result.environment_name.cyan(),
                seconds
            );
        } else {
            failed += 1;
            println!(
                "  {} {} ({:.1}s)",
                "✗".red(),
                result.environment_name.cyan(),
                seconds
            );
            for line in result.message.lines() {
                println!("      {}", line);
            }
        }
    }

    println!();
    if failed > 0 {
        anyhow::bail!("Deploy failed for {} environment(s)", failed);
    }
    println!("{}", "✓ Deploy finished".green().bold());
    Ok(())
}
