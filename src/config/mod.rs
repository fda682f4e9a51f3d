pub mod constants;
pub mod error;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use self::constants::CONFIG_FILE_NAME;
use self::error::{ConfigError, Result};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Server configuration, read from `react-refactor.toml`
///
/// Every field has a default, so a missing file is not an error.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level: error, warn, info, debug, trace
    pub log_level: Option<String>,

    /// Where the insertion line for a new stub is counted from
    pub insert_line: LineSource,

    /// What the generated component renders
    pub stub_body: StubBody,
}

/// Source of the line count used to place an appended stub
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineSource {
    /// Count line feeds in the file as persisted on disk
    #[default]
    Disk,
    /// Count line feeds in the editor's in-memory text
    Buffer,
}

/// Body of the generated component
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StubBody {
    /// `return null`
    #[default]
    Null,
    /// `return <></>`
    Fragment,
}

impl Config {
    /// Load configuration by searching upward from `start_path`
    ///
    /// Falls back to defaults when no config file exists.
    pub fn load(start_path: impl AsRef<Path>) -> Result<Self> {
        match find_config_file(start_path.as_ref())? {
            Some(path) => Self::from_file(&path),
            None => {
                debug!(
                    "No {} found from {}, using defaults",
                    CONFIG_FILE_NAME,
                    start_path.as_ref().display()
                );
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from an explicit file
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        let config: Config = toml::from_str(&data)?;
        config.validate()?;

        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(level) = &self.log_level {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "unknown log_level '{}', expected one of {}",
                    level,
                    LOG_LEVELS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// Find the config file by searching upward from the given path
fn find_config_file(start_path: &Path) -> Result<Option<PathBuf>> {
    let current_dir = if start_path.is_file() {
        start_path.parent().unwrap_or(Path::new("."))
    } else {
        start_path
    };

    let mut current_dir = current_dir.canonicalize()?;

    loop {
        let config_path = current_dir.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Ok(Some(config_path));
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Ok(None),
        }
    }
}
