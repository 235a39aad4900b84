use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A named connection profile: where the service lives, which model to ask,
/// and an optional system prompt sent ahead of every conversation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Persona {
    pub name: String,
    pub api_url: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        api_url: impl Into<String>,
        model: impl Into<String>,
        system_prompt: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into(),
            model: model.into(),
            system_prompt,
        }
    }

    /// The system prompt, if one is set and not blank.
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_persona: Option<String>,
    #[serde(default)]
    pub personas: Vec<Persona>,
}

impl Config {
    pub fn find_persona(&self, name: &str) -> Option<&Persona> {
        self.personas.iter().find(|persona| persona.name == name)
    }

    pub fn find_persona_mut(&mut self, name: &str) -> Option<&mut Persona> {
        self.personas.iter_mut().find(|persona| persona.name == name)
    }
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
