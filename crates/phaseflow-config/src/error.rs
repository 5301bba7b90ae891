use phaseflow_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Environment file not found. Looked in:\n\
        - current directory: phaseflow.local.yml, phaseflow.yml\n\
        - ./.phaseflow/ directory\n\
        Set PHASEFLOW_FILE to point at a file directly"
    )]
    EnvironmentFileNotFound,

    #[error("Account config not found: {0}")]
    AccountConfigNotFound(String),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid environment file:\n{}", .errors.join("\n"))]
    InvalidEnvironmentFile { errors: Vec<String> },

    #[error("Invalid account config: {0}")]
    InvalidAccountConfig(String),

    #[error("Can't find the requested environment in the environment file: {0}")]
    UnknownEnvironment(String),

    #[error(transparent)]
    Environment(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
