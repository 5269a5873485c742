//! Resolution of the policy file and data directory

use std::path::{Path, PathBuf};

use anyhow::Context;
use pinguard_core::PinPolicy;
use tracing::{debug, info};

/// Environment variable overriding the policy file location
pub const CONFIG_ENV: &str = "PINGUARD_CONFIG";

/// Resolved CLI settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub policy: PinPolicy,
    pub data_dir: PathBuf,
}

impl Settings {
    /// Load settings from explicit paths, falling back to platform defaults
    ///
    /// A missing policy file means the default policy; a present but invalid
    /// one is an error.
    pub fn resolve(config: Option<&Path>, data_dir: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = config
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(default_config_path);

        let policy = if config_path.exists() {
            info!("Loading policy from {:?}", config_path);
            PinPolicy::load(&config_path)
                .with_context(|| format!("invalid policy file {}", config_path.display()))?
        } else {
            debug!("No policy at {:?}, using defaults", config_path);
            PinPolicy::default()
        };

        let data_dir = data_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(default_data_dir);

        Ok(Self { policy, data_dir })
    }

    /// Path of the attempt ledger
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.json")
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pinguard")
        .join("policy.toml")
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pinguard")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let settings =
            Settings::resolve(Some(&dir.path().join("absent.toml")), Some(dir.path())).unwrap();
        assert_eq!(settings.policy, PinPolicy::default());
        assert_eq!(settings.ledger_path(), dir.path().join("ledger.json"));
    }

    #[test]
    fn test_config_file_is_loaded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.toml");
        PinPolicy::lenient().save(&path).unwrap();

        let settings = Settings::resolve(Some(&path), Some(dir.path())).unwrap();
        assert_eq!(settings.policy, PinPolicy::lenient());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("policy.toml");
        std::fs::write(&path, "max_attempts = 0\n").unwrap();
        assert!(Settings::resolve(Some(&path), Some(dir.path())).is_err());
    }
}
