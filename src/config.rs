use std::{
    collections::HashMap,
    fs::{self, create_dir_all, exists},
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration directory is known for this platform")]
    MissingConfigDirectory,
    #[error("unable to access configuration file: {0}")]
    UnableToAccessFile(std::io::Error),
    #[error("unable to create directory for configuration: {0}")]
    UnableToCreateDirectory(std::io::Error),
    #[error("unable to write example configuration: {0}")]
    UnableToWriteExampleConfiguration(std::io::Error),
    #[error("unable to read the configuration file: {0}")]
    UnableToReadConfiguration(std::io::Error),
    #[error("unable to deserialize config toml: {0}")]
    UnableToDeserialize(toml::de::Error),
}

const EXAMPLE_CONFIG: &str = include_str!("../example/config.toml");
const CONFIG_DIRECTORY_NAME: &str = "lesion-adapters";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub runner: RunnerConfig,
    pub history: HistoryConfig,
}

/// How generated scripts are executed
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: "Rscript".to_owned(),
            args: vec!["--vanilla".to_owned()],
            env: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    /// Database file, defaults to the platform data directory
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

/// Read the configuration from `path`, or from the default location when no
/// path is given. The default location is seeded with an example
/// configuration on first use.
pub fn read_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_file_path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let config_file_path = default_config_path()?;
            ensure_example_config(&config_file_path)?;
            config_file_path
        }
    };

    debug!(
        "reading configuration from {}",
        config_file_path.to_string_lossy()
    );

    let data =
        fs::read_to_string(&config_file_path).map_err(ConfigError::UnableToReadConfiguration)?;

    parse_config(&data)
}

pub fn parse_config(data: &str) -> Result<Config, ConfigError> {
    toml::from_str::<Config>(data).map_err(ConfigError::UnableToDeserialize)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|directory| directory.join(CONFIG_DIRECTORY_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::MissingConfigDirectory)
}

fn ensure_example_config(config_file_path: &Path) -> Result<(), ConfigError> {
    if exists(config_file_path).map_err(ConfigError::UnableToAccessFile)? {
        return Ok(());
    }

    if let Some(config_dir) = config_file_path.parent() {
        debug!("directory for configuration does not exist yet, creating it");
        create_dir_all(config_dir).map_err(ConfigError::UnableToCreateDirectory)?;
    }

    debug!("writing example config because none exists");
    fs::write(config_file_path, EXAMPLE_CONFIG)
        .map_err(ConfigError::UnableToWriteExampleConfiguration)
}
