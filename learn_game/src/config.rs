use crate::error::ConfigError;
use crate::value_table::PolicyFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const EXPLORATION_RATE: f64 = 0.3;
pub const LEARNING_RATE: f64 = 0.2;
pub const DISCOUNT_RATE: f64 = 0.9;
pub const NUM_EPISODES: usize = 50_000;
pub const LOG_EVERY: usize = 1_000;

/// Hyper-parameters shared by both learning agents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub exploration_rate: f64,
    pub learning_rate: f64,
    pub discount_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Progress is logged every `log_every` episodes.
    pub log_every: usize,
    pub policy_dir: PathBuf,
    pub format: PolicyFormat,
}

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub training: TrainingConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            exploration_rate: EXPLORATION_RATE,
            learning_rate: LEARNING_RATE,
            discount_factor: DISCOUNT_RATE,
        }
    }
}

impl AgentConfig {
    /// Settings for an agent that only exploits what it has learned.
    pub fn frozen() -> Self {
        AgentConfig {
            exploration_rate: 0.0,
            ..Self::default()
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: NUM_EPISODES,
            log_every: LOG_EVERY,
            policy_dir: PathBuf::from("."),
            format: PolicyFormat::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`AppConfig::load`], but falls back to defaults when the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("agent.exploration_rate", self.agent.exploration_rate),
            ("agent.learning_rate", self.agent.learning_rate),
            ("agent.discount_factor", self.agent.discount_factor),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!("{name} must be in [0, 1]")));
            }
        }
        if self.agent.learning_rate == 0.0 {
            return Err(ConfigError::Validation(
                "agent.learning_rate must be > 0".into(),
            ));
        }
        if self.training.episodes == 0 {
            return Err(ConfigError::Validation(
                "training.episodes must be > 0".into(),
            ));
        }
        if self.training.log_every == 0 {
            return Err(ConfigError::Validation(
                "training.log_every must be > 0".into(),
            ));
        }
        Ok(())
    }
}
