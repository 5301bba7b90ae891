mod builtin;
mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phaseflow")]
#[command(about = "Deploy interdependent cloud services, phase by phase", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the environment file and account config come from
#[derive(Args, Debug, Clone)]
pub struct Source {
    /// Environment file (default: PHASEFLOW_FILE, then phaseflow.local.yml / phaseflow.yml)
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Account config file path or base64-encoded YAML
    #[arg(short = 'a', long = "account-config", env = "PHASEFLOW_ACCOUNT_CONFIG")]
    pub account_config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the environment file and run the check phase
    Check {
        #[command(flatten)]
        source: Source,
        /// Environment to check (default: all)
        #[arg(short = 'e', long = "environment")]
        environment: Option<String>,
    },
    /// Show the deploy order of an environment
    Order {
        #[command(flatten)]
        source: Source,
        /// Environment name
        #[arg(short = 'e', long = "environment")]
        environment: String,
    },
    /// Deploy one or more environments
    Deploy {
        #[command(flatten)]
        source: Source,
        /// Environments to deploy (comma separated)
        #[arg(short = 'e', long = "environments", value_delimiter = ',', required = true)]
        environments: Vec<String>,
    },
    /// Tear down an environment
    Delete {
        #[command(flatten)]
        source: Source,
        /// Environment name
        #[arg(short = 'e', long = "environment")]
        environment: String,
        /// Run without confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// List registered service types
    Types,
    /// Show version information
    Version,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match cli.command {
        Commands::Check {
            source,
            environment,
        } => commands::check::handle(&source, environment.as_deref())?,
        Commands::Order {
            source,
            environment,
        } => commands::order::handle(&source, &environment)?,
        Commands::Deploy {
            source,
            environments,
        } => commands::deploy::handle(&source, &environments).await?,
        Commands::Delete {
            source,
            environment,
            yes,
        } => commands::delete::handle(&source, &environment, yes).await?,
        Commands::Types => commands::types::handle()?,
        Commands::Version => {
            println!("phaseflow {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
