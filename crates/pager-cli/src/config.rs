//! Configuration resolution for the Pager client.
//!
//! Built-in defaults, optionally overridden by a JSON settings file
//! (`~/.config/pager/settings.json` or an explicit `--config` path).

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Deserialize;

use pager_crypto::BootstrapParams;

/// Pager client configuration. Read-only: the client never writes its
/// settings file back.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Location of the persisted identity seed, if not the default.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
    /// One-time prekeys generated per bootstrap.
    #[serde(default = "default_pre_key_count")]
    pub pre_key_count: u32,
    /// Fixed id of the signed prekey.
    #[serde(default = "default_signed_pre_key_id")]
    pub signed_pre_key_id: u32,
}

const fn default_pre_key_count() -> u32 {
    pager_crypto::bootstrap::PRE_KEY_COUNT
}

const fn default_signed_pre_key_id() -> u32 {
    pager_crypto::bootstrap::SIGNED_PRE_KEY_ID
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed_file: None,
            pre_key_count: default_pre_key_count(),
            signed_pre_key_id: default_signed_pre_key_id(),
        }
    }
}

impl Config {
    /// Resolve the seed file location.
    pub fn seed_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.seed_file {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().context("could not determine the user data directory")?;
        Ok(data_dir.join("pager").join("identity.seed"))
    }

    /// Bootstrap parameters derived from this configuration.
    pub const fn bootstrap_params(&self) -> BootstrapParams {
        BootstrapParams {
            pre_key_count: self.pre_key_count,
            pre_key_start_id: pager_crypto::bootstrap::PRE_KEY_START_ID,
            signed_pre_key_id: self.signed_pre_key_id,
        }
    }
}

/// Default settings file under the user config directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pager").join("settings.json"))
}

/// Load configuration.
///
/// An explicit path must exist and parse; the default path is optional
/// and silently falls back to built-in defaults when absent.
pub fn load(explicit_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit_path {
        return read_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }

    match default_config_path() {
        Some(path) if path.exists() => read_config(&path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        _ => Ok(Config::default()),
    }
}

fn read_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&contents)?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_bootstrap_constants() {
        let config = Config::default();
        let params = config.bootstrap_params();
        assert_eq!(params.pre_key_count, 100);
        assert_eq!(params.pre_key_start_id, 1);
        assert_eq!(params.signed_pre_key_id, 5);
    }

    #[test]
    fn explicit_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"seed_file": "/tmp/custom.seed", "pre_key_count": 50}}"#
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        assert_eq!(config.seed_file, Some(PathBuf::from("/tmp/custom.seed")));
        assert_eq!(config.pre_key_count, 50);
        // Unset fields keep their defaults.
        assert_eq!(config.signed_pre_key_id, 5);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let result = load(Some(Path::new("/nonexistent/settings.json")));
        assert!(result.is_err());
    }

    #[test]
    fn seed_path_prefers_the_configured_location() {
        let config = Config {
            seed_file: Some(PathBuf::from("/tmp/seed.bin")),
            ..Config::default()
        };
        assert_eq!(config.seed_path().unwrap(), PathBuf::from("/tmp/seed.bin"));
    }
}
