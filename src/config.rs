//! Configuration for the command line tool.
//!
//! Read from a JSON file, then overridden from the environment (a `.env` file
//! is loaded by `main` before this runs).

use crate::ipfilter::IpFilter;
use crate::vault::read_password_file;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};

/// Comma separated spec list replacing `allowed_ips`.
pub const ALLOWED_IPS_ENV: &str = "IPFILTER_ALLOWED_IPS";
/// Default environment variable holding the vault password.
pub const VAULT_PASSWORD_ENV: &str = "VAULT_PASSWORD";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Specs checked by `check` when no override is given.
    pub allowed_ips: IpFilter,
    pub vault: VaultConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VaultConfig {
    /// File holding the vault password; wins over `password_env`.
    pub password_file: Option<PathBuf>,
    /// Environment variable holding the vault password.
    pub password_env: String,
    /// Wrap encrypted output at 80 columns.
    pub chunked: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            password_file: None,
            password_env: VAULT_PASSWORD_ENV.to_string(),
            chunked: true,
        }
    }
}

impl Config {
    /// Load the config file when given (defaults otherwise) and apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Config, Box<dyn Error>> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => {
                log::debug!("No config file given, using defaults");
                Config::default()
            }
        };
        if let Ok(value) = std::env::var(ALLOWED_IPS_ENV) {
            log::info!("Using allowed IPs from {ALLOWED_IPS_ENV}");
            config.override_allowed_ips(&value);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Config, Box<dyn Error>> {
        if !path.exists() {
            return Err(format!("Config file does not exist: {}", path.display()).into());
        }
        log::info!("Reading config file: {}", path.display());
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Error reading config file {}: {e}", path.display()))?;
        Config::from_json(&json)
    }

    /// Parse JSON; errors name the path of the offending field.
    pub fn from_json(json: &str) -> Result<Config, Box<dyn Error>> {
        let de = &mut serde_json::Deserializer::from_str(json);
        let config: Config = serde_path_to_error::deserialize(de)
            .map_err(|e| format!("Error parsing config JSON at '{}': {}", e.path(), e.inner()))?;
        log::debug!("Config has {} allowed specs", config.allowed_ips.specs().len());
        Ok(config)
    }

    /// Replace `allowed_ips` with a comma separated list; blank entries are
    /// ignored.
    pub fn override_allowed_ips(&mut self, value: &str) {
        self.allowed_ips = value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
    }

    /// Vault password from the configured file, else from the configured
    /// environment variable.
    pub fn vault_password(&self) -> Result<String, Box<dyn Error>> {
        if let Some(file) = &self.vault.password_file {
            return Ok(read_password_file(file)?);
        }
        std::env::var(&self.vault.password_env).map_err(|_| {
            format!(
                "No vault password: set {} or configure vault.password_file",
                self.vault.password_env
            )
            .into()
        })
    }
}
