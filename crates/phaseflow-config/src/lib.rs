//! PhaseFlow configuration
//!
//! Loads the environment file describing an application's environments and the
//! account config shared by all of their services.

pub mod account;
pub mod environment_file;
pub mod error;

pub use account::{default_account_config_path, load_account_config};
pub use environment_file::{EnvironmentFile, EnvironmentSpec, SUPPORTED_VERSION};
pub use error::*;

use std::path::PathBuf;
use tracing::debug;

/// Environment variable pointing directly at an environment file
pub const FILE_ENV_VAR: &str = "PHASEFLOW_FILE";

const CANDIDATES: [&str; 2] = ["phaseflow.local.yml", "phaseflow.yml"];

/// Find the environment file of the current project
///
/// Search order:
/// 1. `PHASEFLOW_FILE`
/// 2. current directory: `phaseflow.local.yml`, `phaseflow.yml`
/// 3. `./.phaseflow/`: same order
pub fn find_environment_file() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(FILE_ENV_VAR) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        debug!(path = %path.display(), "{} points at a missing file", FILE_ENV_VAR);
    }

    let current_dir = std::env::current_dir()?;
    for dir in [current_dir.clone(), current_dir.join(".phaseflow")] {
        if !dir.is_dir() {
            continue;
        }
        for filename in CANDIDATES {
            let path = dir.join(filename);
            if path.exists() {
                debug!(path = %path.display(), "Found environment file");
                return Ok(path);
            }
        }
    }

    Err(ConfigError::EnvironmentFileNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    fn in_dir<T>(dir: &std::path::Path, f: impl FnOnce() -> T) -> T {
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        let result = f();
        std::env::set_current_dir(original_dir).unwrap();
        result
    }

    #[test]
    #[serial]
    fn test_find_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("phaseflow.yml"), "version: 1").unwrap();

        let found = temp_env::with_var_unset(FILE_ENV_VAR, || {
            in_dir(temp_dir.path(), find_environment_file)
        })
        .unwrap();
        assert!(found.ends_with("phaseflow.yml"));
    }

    #[test]
    #[serial]
    fn test_local_file_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("phaseflow.yml"), "version: 1").unwrap();
        fs::write(temp_dir.path().join("phaseflow.local.yml"), "version: 1").unwrap();

        let found = temp_env::with_var_unset(FILE_ENV_VAR, || {
            in_dir(temp_dir.path(), find_environment_file)
        })
        .unwrap();
        assert!(found.ends_with("phaseflow.local.yml"));
    }

    #[test]
    #[serial]
    fn test_find_in_phaseflow_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join(".phaseflow");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("phaseflow.yml"), "version: 1").unwrap();

        let found = temp_env::with_var_unset(FILE_ENV_VAR, || {
            in_dir(temp_dir.path(), find_environment_file)
        })
        .unwrap();
        assert!(found.ends_with(".phaseflow/phaseflow.yml"));
    }

    #[test]
    #[serial]
    fn test_env_var_takes_precedence() {
        let temp_dir = tempfile::tempdir().unwrap();
        let custom = temp_dir.path().join("custom.yml");
        fs::write(&custom, "version: 1").unwrap();
        fs::write(temp_dir.path().join("phaseflow.yml"), "version: 1").unwrap();

        let found = temp_env::with_var(FILE_ENV_VAR, Some(custom.to_str().unwrap()), || {
            in_dir(temp_dir.path(), find_environment_file)
        })
        .unwrap();
        assert_eq!(found, custom);
    }

    #[test]
    #[serial]
    fn test_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();

        let result = temp_env::with_var_unset(FILE_ENV_VAR, || {
            in_dir(temp_dir.path(), find_environment_file)
        });
        assert!(matches!(result, Err(ConfigError::EnvironmentFileNotFound)));
    }
}
