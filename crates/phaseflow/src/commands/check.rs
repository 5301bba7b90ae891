use crate::Source;
use colored::Colorize;
use phaseflow_deploy::{DeployError, check_environment};

pub fn handle(source: &Source, environment: Option<&str>) -> anyhow::Result<()> {
    println!("{}", "Checking environment file...".blue());
    let (_, file) = super::load_file(source)?;
    let account = super::load_account(source)?;
    let registry = super::registry()?;

    let names: Vec<String> = match environment {
        Some(name) => vec![name.to_string()],
        None => file.environment_names().map(String::from).collect(),
    };

    let mut failed = 0;
    for environment in super::build_environments(&file, &names, &account)? {
        let name = &environment.environment_name;
        match check_environment(&environment, &registry) {
            Ok(order) => {
                println!(
                    "  {} {} ({} services, {} levels)",
                    "✓".green(),
                    name.cyan(),
                    environment.len(),
                    order.len()
                );
            }
            Err(DeployError::CheckFailed { errors, .. }) => {
                failed += 1;
                println!("  {} {}", "✗".red(), name.cyan());
                for error in errors {
                    println!("      {}", error);
                }
            }
            Err(e) => {
                failed += 1;
                println!("  {} {}: {} ({})", "✗".red(), name.cyan(), e, e.kind());
            }
        }
    }

    println!();
    if failed > 0 {
        anyhow::bail!("Check failed for {} environment(s)", failed);
    }
    println!("{}", "✓ Check passed".green().bold());
    Ok(())
}
