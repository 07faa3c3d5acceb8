//! Configuration file support for the JEFIT importer.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/jefit/config.toml`.

use crate::clock::Zone;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub parser: ParserConfig,
}

/// Input file configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_input_path")]
    pub default_path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            default_path: default_input_path(),
        }
    }
}

/// What to do with an exercise log whose session id was never registered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingPolicy {
    /// Fail the parse with a dangling reference error
    #[default]
    Error,
    /// Log a warning and discard the record
    Drop,
}

impl FromStr for DanglingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "error" => Ok(DanglingPolicy::Error),
            "drop" => Ok(DanglingPolicy::Drop),
            other => Err(Error::Config(format!(
                "Unknown dangling reference policy '{}' (expected error or drop)",
                other
            ))),
        }
    }
}

/// Parser behaviour configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub timezone: Zone,

    #[serde(default)]
    pub dangling_sessions: DanglingPolicy,

    /// Reject non-blank rows outside any known section
    #[serde(default)]
    pub strict_sections: bool,

    /// Accept end of input as the terminator of the final section
    #[serde(default)]
    pub eof_terminates_section: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            timezone: Zone::Local,
            dangling_sessions: DanglingPolicy::Error,
            strict_sections: false,
            eof_terminates_section: false,
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("data.csv")
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            config_path => {
                tracing::debug!(
                    "No config file found at {:?}, using defaults",
                    config_path
                );
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("jefit").join("config.toml"))
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
