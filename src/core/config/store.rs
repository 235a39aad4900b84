use crate::core::config::data::Config;
use crate::core::config::io::ConfigError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Owns the config file path. Every load goes back to disk, so edits made
/// in another window show up on the next read whatever their timestamps.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(Config::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        debug!(path = %self.path.display(), "reading config");
        Config::load_from_path(&self.path)
    }

    pub fn persist(&self, config: &Config) -> Result<(), ConfigError> {
        config.save_to_path(&self.path)?;
        debug!(path = %self.path.display(), personas = config.personas.len(), "config saved");
        Ok(())
    }
}
