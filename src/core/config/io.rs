use crate::core::config::data::{path_display, Config};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Errors that can occur when loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No platform configuration directory could be determined.
    NoConfigDir,

    /// The configuration file does not exist yet.
    Missing { path: PathBuf },

    /// Failed to read the configuration file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file exists but is not a valid configuration.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to write the configuration back to disk.
    Write {
        path: PathBuf,
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl ConfigError {
    pub fn is_missing(&self) -> bool {
        matches!(self, ConfigError::Missing { .. })
    }

    fn write(path: &Path, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        ConfigError::Write {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoConfigDir => write!(f, "Failed to determine config directory"),
            ConfigError::Missing { path } => {
                write!(f, "No config found at {}", path_display(path))
            }
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path_display(path), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path_display(path), source)
            }
            ConfigError::Write { path, source } => {
                write!(f, "Failed to save config to {}: {}", path_display(path), source)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Write { source, .. } => Some(source.as_ref()),
            ConfigError::NoConfigDir | ConfigError::Missing { .. } => None,
        }
    }
}

impl Config {
    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        let contents = match fs::read_to_string(config_path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::Missing {
                    path: config_path.to_path_buf(),
                })
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: config_path.to_path_buf(),
                    source,
                })
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), ConfigError> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|err| ConfigError::write(config_path, err))?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|err| ConfigError::write(config_path, err))?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|err| ConfigError::write(config_path, err))?;

        temp_file
            .write_all(contents.as_bytes())
            .and_then(|_| temp_file.as_file_mut().sync_all())
            .map_err(|err| ConfigError::write(config_path, err))?;
        temp_file
            .persist(config_path)
            .map_err(|err| ConfigError::write(config_path, err))?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = ProjectDirs::from("org", "meh", "meh").ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}
