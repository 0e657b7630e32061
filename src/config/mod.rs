//! # Configuration Management Module
//!
//! Centralized, TOML-backed configuration for the idle dice engine: game balance constants,
//! the static dice catalog, storage location, autosave cadence and logging.
//!
//! ## Configuration Structure
//!
//! - [`PrestigeConfig`] - prestige requirement and reward curve
//! - [`EconomyConfig`] - dice value upgrade pricing and bonus
//! - [`DiceSpec`] - one entry of the static dice catalog (`[[dice]]` tables)
//! - [`StorageConfig`] - save file location and backup rotation
//! - [`AutosaveConfig`] - periodic autosave
//! - [`LoggingConfig`] - log level and optional file sink
//!
//! ## Usage
//!
//! ```rust,no_run
//! use idledice::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("idledice.toml").await?;
//!     println!("Save file: {}", config.storage.save_path().display());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [prestige]
//! base_requirement = 1000000.0
//! scaling_factor = 10.0
//! dark_matter_per_prestige = 1.0
//! level_scaling = 1.1
//!
//! [storage]
//! data_dir = "./data"
//! save_file = "save.json"
//! backup_count = 3
//!
//! [[dice]]
//! id = "basic"
//! name = "Basic Die"
//! base_price = 10.0
//! growth_rate = 1.15
//! tier_multiplier = 1.0
//! faces = 6
//! ```
//!
//! Every section is optional and falls back to its defaults. [`Config::validate`] rejects a
//! catalog without the `basic` die, duplicate ids and non-positive prices or growth rates.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::fs;

use crate::economy::types::BASIC_DICE_ID;
use crate::storage::autosave::AutosaveConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestigeConfig {
    /// Lifetime money needed for the first prestige.
    pub base_requirement: f64,
    /// Requirement multiplier applied per prestige level.
    pub scaling_factor: f64,
    pub dark_matter_per_prestige: f64,
    /// Reward multiplier applied per prestige level.
    pub level_scaling: f64,
}

impl Default for PrestigeConfig {
    fn default() -> Self {
        Self {
            base_requirement: 1_000_000.0,
            scaling_factor: 10.0,
            dark_matter_per_prestige: 1.0,
            level_scaling: 1.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    pub value_upgrade_base_cost: f64,
    pub value_upgrade_growth: f64,
    /// Extra payout fraction per dice value upgrade level (0.25 = +25% per level).
    pub value_upgrade_bonus: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            value_upgrade_base_cost: 50.0,
            value_upgrade_growth: 1.5,
            value_upgrade_bonus: 0.25,
        }
    }
}

/// Static description of one dice type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceSpec {
    pub id: String,
    pub name: String,
    pub base_price: f64,
    pub growth_rate: f64,
    /// Payout multiplier applied to every face rolled by this type.
    pub tier_multiplier: f64,
    pub faces: u32,
}

impl DiceSpec {
    pub fn new(
        id: &str,
        name: &str,
        base_price: f64,
        growth_rate: f64,
        tier_multiplier: f64,
        faces: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_price,
            growth_rate,
            tier_multiplier,
            faces,
        }
    }
}

pub fn default_dice_catalog() -> Vec<DiceSpec> {
    vec![
        DiceSpec::new(BASIC_DICE_ID, "Basic Die", 10.0, 1.15, 1.0, 6),
        DiceSpec::new("silver", "Silver Die", 250.0, 1.17, 5.0, 6),
        DiceSpec::new("gold", "Gold Die", 5_000.0, 1.2, 30.0, 8),
        DiceSpec::new("cosmic", "Cosmic Die", 150_000.0, 1.25, 250.0, 12),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub save_file: String,
    /// Number of rotated previous saves to keep (0 disables rotation).
    pub backup_count: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            save_file: "save.json".to_string(),
            backup_count: 3,
        }
    }
}

impl StorageConfig {
    pub fn save_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.save_file)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub prestige: PrestigeConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default = "default_dice_catalog")]
    pub dice: Vec<DiceSpec>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub autosave: AutosaveConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prestige: PrestigeConfig::default(),
            economy: EconomyConfig::default(),
            dice: default_dice_catalog(),
            storage: StorageConfig::default(),
            autosave: AutosaveConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::from_toml_str(&content).map_err(|e| anyhow!("Invalid config file {}: {}", path, e))
    }

    /// Parse and validate TOML content.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| anyhow!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.prestige;
        if !(p.base_requirement > 0.0 && p.scaling_factor > 1.0) {
            return Err(anyhow!(
                "prestige.base_requirement must be > 0 and prestige.scaling_factor > 1"
            ));
        }
        if !(p.dark_matter_per_prestige > 0.0 && p.level_scaling > 0.0) {
            return Err(anyhow!(
                "prestige.dark_matter_per_prestige and prestige.level_scaling must be > 0"
            ));
        }
        let e = &self.economy;
        if !(e.value_upgrade_base_cost > 0.0 && e.value_upgrade_growth >= 1.0) {
            return Err(anyhow!(
                "economy.value_upgrade_base_cost must be > 0 and value_upgrade_growth >= 1"
            ));
        }
        if e.value_upgrade_bonus < 0.0 {
            return Err(anyhow!("economy.value_upgrade_bonus must not be negative"));
        }

        let mut seen = HashSet::new();
        for spec in &self.dice {
            if !seen.insert(spec.id.as_str()) {
                return Err(anyhow!("duplicate dice id '{}'", spec.id));
            }
            if !(spec.base_price > 0.0 && spec.growth_rate >= 1.0) {
                return Err(anyhow!(
                    "dice '{}' needs base_price > 0 and growth_rate >= 1",
                    spec.id
                ));
            }
            if spec.faces == 0 || spec.tier_multiplier < 0.0 {
                return Err(anyhow!(
                    "dice '{}' needs faces > 0 and a non-negative tier_multiplier",
                    spec.id
                ));
            }
        }
        if !seen.contains(BASIC_DICE_ID) {
            return Err(anyhow!("dice catalog must contain '{}'", BASIC_DICE_ID));
        }
        if self.storage.save_file.trim().is_empty() {
            return Err(anyhow!("storage.save_file must not be empty"));
        }
        Ok(())
    }
}
