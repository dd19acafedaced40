use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::{
    core::projection::{CarryOverMode, ProjectionSettings},
    errors::{BudgetError, Result},
    utils::paths::{app_data_dir, config_file_in, ensure_dir, write_atomic},
};

/// User-level settings persisted next to the state snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    pub lookback_months: u32,
    pub carry_over_mode: CarryOverMode,
    pub backup_retention: usize,
}

impl Default for Config {
    fn default() -> Self {
        let projection = ProjectionSettings::default();
        Self {
            locale: "fr-FR".into(),
            currency: "EUR".into(),
            lookback_months: projection.lookback_months,
            carry_over_mode: projection.carry_over,
            backup_retention: 5,
        }
    }
}

impl Config {
    pub fn projection_settings(&self) -> ProjectionSettings {
        ProjectionSettings {
            lookback_months: self.lookback_months,
            carry_over: self.carry_over_mode,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backup_retention == 0 {
            return Err(BudgetError::ConfigError(
                "backup_retention must keep at least one backup".into(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(BudgetError::ConfigError(
                "currency must not be empty".into(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
        })
    }

    /// Returns defaults when no configuration was saved yet.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no configuration file, using defaults");
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| BudgetError::ConfigError(format!("{}: {}", self.path.display(), err)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
