//! Account configuration loading
//!
//! The account config argument is either a path to a YAML file or the same
//! YAML document encoded as base64, which is handy in CI secrets.

use crate::error::{ConfigError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use phaseflow_core::AccountConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the per-user default account config
pub const DEFAULT_ACCOUNT_FILE: &str = "account.yml";

/// Load an account config from a file path or a base64-encoded document
pub fn load_account_config(param: &str) -> Result<AccountConfig> {
    let path = Path::new(param);
    let config = if path.is_file() {
        debug!(path = %path.display(), "Loading account config from file");
        let content = std::fs::read_to_string(path)?;
        parse_account_config(&content)?
    } else {
        let decoded = STANDARD
            .decode(param.trim())
            .map_err(|_| ConfigError::AccountConfigNotFound(param.to_string()))?;
        let content = String::from_utf8(decoded)
            .map_err(|_| ConfigError::AccountConfigNotFound(param.to_string()))?;
        debug!("Loading account config from base64 argument");
        parse_account_config(&content)?
    };

    validate_account_config(&config)?;
    Ok(config)
}

fn parse_account_config(content: &str) -> Result<AccountConfig> {
    serde_yaml::from_str(content).map_err(|e| ConfigError::InvalidAccountConfig(e.to_string()))
}

fn validate_account_config(config: &AccountConfig) -> Result<()> {
    for (field, value) in [("account_id", &config.account_id), ("region", &config.region)] {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidAccountConfig(format!(
                "'{field}' field missing in the account config file"
            )));
        }
    }
    Ok(())
}

/// `~/.config/phaseflow/account.yml`, if it exists
pub fn default_account_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?
        .join("phaseflow")
        .join(DEFAULT_ACCOUNT_FILE);
    path.is_file().then_some(path)
}
