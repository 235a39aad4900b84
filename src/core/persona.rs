use crate::core::config::{Config, ConfigError, ConfigStore, Persona};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Reasons a persona change is refused.
#[derive(Debug)]
pub enum PersonaError {
    EmptyName,
    Duplicate(String),
    NotFound(String),
    Config(ConfigError),
}

impl fmt::Display for PersonaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersonaError::EmptyName => write!(f, "Persona name cannot be empty"),
            PersonaError::Duplicate(name) => write!(f, "A persona named '{name}' already exists"),
            PersonaError::NotFound(name) => write!(f, "Persona '{name}' not found"),
            PersonaError::Config(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for PersonaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersonaError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for PersonaError {
    fn from(err: ConfigError) -> Self {
        PersonaError::Config(err)
    }
}

/// Personas backed by the config file.
///
/// Mutations are validated against the in-memory copy first and only then
/// written to disk; the in-memory copy changes only after the write succeeds.
pub struct PersonaStore {
    config: Config,
    backing: ConfigStore,
    on_disk: bool,
}

impl PersonaStore {
    /// Load personas from `backing`. A missing file yields an empty store.
    pub fn load(backing: ConfigStore) -> Result<Self, ConfigError> {
        let (config, on_disk) = match backing.load() {
            Ok(config) => (config, true),
            Err(err) if err.is_missing() => (Config::default(), false),
            Err(err) => return Err(err),
        };
        debug!(personas = config.personas.len(), on_disk, "persona store loaded");
        Ok(Self {
            config,
            backing,
            on_disk,
        })
    }

    /// Re-read the backing file. On a malformed file the current personas
    /// are kept and the error is returned.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        match self.backing.load() {
            Ok(config) => {
                self.config = config;
                self.on_disk = true;
                Ok(())
            }
            Err(err) if err.is_missing() => {
                self.config = Config::default();
                self.on_disk = false;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "keeping previously loaded personas");
                Err(err)
            }
        }
    }

    /// Whether a config file existed the last time it was read or written.
    pub fn exists_on_disk(&self) -> bool {
        self.on_disk
    }

    pub fn path(&self) -> &Path {
        self.backing.path()
    }

    pub fn list(&self) -> &[Persona] {
        &self.config.personas
    }

    pub fn is_empty(&self) -> bool {
        self.config.personas.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<Persona> {
        self.config.find_persona(name).cloned()
    }

    pub fn default_persona(&self) -> Option<Persona> {
        let name = self.config.default_persona.as_deref()?;
        self.find(name)
    }

    pub fn default_name(&self) -> Option<&str> {
        self.config.default_persona.as_deref()
    }

    /// Check that `name` could be added, without touching disk.
    pub fn validate_name(&self, name: &str) -> Result<(), PersonaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PersonaError::EmptyName);
        }
        if self.config.find_persona(name).is_some() {
            return Err(PersonaError::Duplicate(name.to_string()));
        }
        Ok(())
    }

    pub fn add(&mut self, mut persona: Persona, make_default: bool) -> Result<(), PersonaError> {
        persona.name = persona.name.trim().to_string();
        self.validate_name(&persona.name)?;

        let mut updated = self.config.clone();
        if make_default {
            updated.default_persona = Some(persona.name.clone());
        }
        debug!(name = %persona.name, make_default, "adding persona");
        updated.personas.push(persona);

        self.commit(updated)
    }

    pub fn update_model(&mut self, name: &str, model: &str) -> Result<(), PersonaError> {
        let mut updated = self.config.clone();
        let persona = updated
            .find_persona_mut(name)
            .ok_or_else(|| PersonaError::NotFound(name.to_string()))?;
        persona.model = model.to_string();

        self.commit(updated)
    }

    fn commit(&mut self, updated: Config) -> Result<(), PersonaError> {
        self.backing.persist(&updated)?;
        self.config = updated;
        self.on_disk = true;
        Ok(())
    }
}
