use tui_textarea::{Input, Key, TextArea};

use crate::core::app::input::{field_input, field_paste, field_text, text_field, text_field_with};
use crate::core::app::picker::{PickerItem, PickerState};
use crate::core::config::Persona;
use crate::core::persona::{PersonaError, PersonaStore};
use crate::utils::url::{has_http_scheme, normalize_base_url};

pub const DEFAULT_API_URL: &str = "http://localhost:11434/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Name,
    ApiUrl,
    Model,
    SystemPrompt,
    MakeDefault,
    Confirm,
}

impl WizardStep {
    pub fn title(self) -> &'static str {
        match self {
            WizardStep::Name => "Persona name",
            WizardStep::ApiUrl => "API URL",
            WizardStep::Model => "Model",
            WizardStep::SystemPrompt => "System prompt (optional)",
            WizardStep::MakeDefault => "Use as default persona?",
            WizardStep::Confirm => "All done?",
        }
    }

    pub fn number(self) -> usize {
        match self {
            WizardStep::Name => 1,
            WizardStep::ApiUrl => 2,
            WizardStep::Model => 3,
            WizardStep::SystemPrompt => 4,
            WizardStep::MakeDefault => 5,
            WizardStep::Confirm => 6,
        }
    }
}

pub const WIZARD_STEPS: usize = 6;

/// How the model step collects its answer.
#[derive(Debug, Clone)]
pub enum ModelChoice {
    /// Pick from the models the endpoint reported.
    Listed(PickerState),
    /// The endpoint reported no models; type a name.
    Manual,
}

/// What the caller has to do after the wizard consumed a submit.
#[derive(Debug, PartialEq, Eq)]
pub enum WizardEvent {
    /// Input was consumed; stay on screen.
    Continue,
    /// The URL needs checking before the wizard can advance.
    VerifyEndpoint { url: String },
    /// The persona was saved.
    Created { persona: Persona, make_default: bool },
}

/// Collects a new persona one field at a time.
pub struct PersonaWizard {
    step: WizardStep,
    field: TextArea<'static>,
    name: String,
    api_url: String,
    model: String,
    model_choice: Option<ModelChoice>,
    system_prompt: String,
    make_default: bool,
    pending_check: Option<u64>,
    error: Option<String>,
}

impl PersonaWizard {
    pub fn new(make_default: bool) -> Self {
        Self {
            step: WizardStep::Name,
            field: text_field("e.g. dev"),
            name: String::new(),
            api_url: String::new(),
            model: String::new(),
            model_choice: None,
            system_prompt: String::new(),
            make_default,
            pending_check: None,
            error: None,
        }
    }

    /// Start with the name already filled in, for a persona asked for by
    /// name that does not exist yet.
    pub fn with_name(name: &str, make_default: bool) -> Self {
        let mut wizard = Self::new(make_default);
        wizard.name = name.trim().to_string();
        wizard.advance_to(WizardStep::Name);
        wizard
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn field(&self) -> &TextArea<'static> {
        &self.field
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn model_choice(&self) -> Option<&ModelChoice> {
        self.model_choice.as_ref()
    }

    pub fn make_default(&self) -> bool {
        self.make_default
    }

    pub fn is_checking(&self) -> bool {
        self.pending_check.is_some()
    }

    /// The persona as entered so far.
    pub fn draft(&self) -> Persona {
        let system_prompt = self.system_prompt.trim();
        Persona::new(
            self.name.trim(),
            self.api_url.clone(),
            self.model.clone(),
            (!system_prompt.is_empty()).then(|| system_prompt.to_string()),
        )
    }

    pub fn handle_input(&mut self, input: Input) -> bool {
        if self.pending_check.is_some() {
            return false;
        }
        match self.step {
            WizardStep::Name | WizardStep::ApiUrl | WizardStep::SystemPrompt => {
                field_input(&mut self.field, input)
            }
            WizardStep::Model => match &mut self.model_choice {
                Some(ModelChoice::Manual) => field_input(&mut self.field, input),
                Some(ModelChoice::Listed(picker)) => match input.key {
                    Key::Up => {
                        picker.move_up();
                        true
                    }
                    Key::Down => {
                        picker.move_down();
                        true
                    }
                    _ => false,
                },
                None => false,
            },
            WizardStep::MakeDefault => match input.key {
                Key::Char('y') | Key::Char('Y') => {
                    self.make_default = true;
                    true
                }
                Key::Char('n') | Key::Char('N') => {
                    self.make_default = false;
                    true
                }
                Key::Left | Key::Right | Key::Up | Key::Down | Key::Tab | Key::Char(' ') => {
                    self.make_default = !self.make_default;
                    true
                }
                _ => false,
            },
            WizardStep::Confirm => false,
        }
    }

    pub fn paste(&mut self, text: &str) -> bool {
        let accepts_text = match self.step {
            WizardStep::Name | WizardStep::ApiUrl | WizardStep::SystemPrompt => true,
            WizardStep::Model => matches!(self.model_choice, Some(ModelChoice::Manual)),
            WizardStep::MakeDefault | WizardStep::Confirm => false,
        };
        accepts_text && self.pending_check.is_none() && field_paste(&mut self.field, text)
    }

    /// Enter on the current step.
    pub fn submit(&mut self, store: &mut PersonaStore) -> WizardEvent {
        if self.pending_check.is_some() {
            return WizardEvent::Continue;
        }
        self.error = None;

        match self.step {
            WizardStep::Name => {
                let name = field_text(&self.field).trim().to_string();
                match store.validate_name(&name) {
                    Ok(()) => {
                        self.name = name;
                        self.advance_to(WizardStep::ApiUrl);
                    }
                    Err(err) => self.error = Some(err.to_string()),
                }
                WizardEvent::Continue
            }
            WizardStep::ApiUrl => {
                let url = normalize_base_url(&field_text(&self.field));
                if !has_http_scheme(&url) {
                    self.error = Some("URL must start with http:// or https://".to_string());
                    return WizardEvent::Continue;
                }
                self.api_url = url.clone();
                WizardEvent::VerifyEndpoint { url }
            }
            WizardStep::Model => {
                let model = match &self.model_choice {
                    Some(ModelChoice::Listed(picker)) => {
                        picker.selected_id().unwrap_or_default().to_string()
                    }
                    _ => field_text(&self.field).trim().to_string(),
                };
                if model.is_empty() {
                    self.error = Some("Model cannot be empty".to_string());
                } else {
                    self.model = model;
                    self.advance_to(WizardStep::SystemPrompt);
                }
                WizardEvent::Continue
            }
            WizardStep::SystemPrompt => {
                self.system_prompt = field_text(&self.field).trim().to_string();
                self.advance_to(WizardStep::MakeDefault);
                WizardEvent::Continue
            }
            WizardStep::MakeDefault => {
                self.advance_to(WizardStep::Confirm);
                WizardEvent::Continue
            }
            WizardStep::Confirm => {
                let persona = self.draft();
                match store.add(persona.clone(), self.make_default) {
                    Ok(()) => WizardEvent::Created {
                        persona,
                        make_default: self.make_default,
                    },
                    Err(err) => {
                        if matches!(err, PersonaError::Duplicate(_) | PersonaError::EmptyName) {
                            self.advance_to(WizardStep::Name);
                        }
                        self.error = Some(err.to_string());
                        WizardEvent::Continue
                    }
                }
            }
        }
    }

    /// Record that a check with `check_id` is in flight for the URL step.
    pub fn begin_check(&mut self, check_id: u64) {
        self.pending_check = Some(check_id);
    }

    /// Apply an endpoint check result. Results for any other check id are
    /// stale and ignored; returns whether this one was applied.
    pub fn endpoint_checked(&mut self, check_id: u64, result: Result<Vec<String>, String>) -> bool {
        if self.pending_check != Some(check_id) || self.step != WizardStep::ApiUrl {
            return false;
        }
        self.pending_check = None;

        match result {
            Ok(models) if models.is_empty() => {
                self.model_choice = Some(ModelChoice::Manual);
                self.advance_to(WizardStep::Model);
                self.error = Some("No models reported by this endpoint; type a model name".into());
            }
            Ok(models) => {
                let items = models
                    .iter()
                    .map(|name| PickerItem::new(name.clone(), name.clone()))
                    .collect();
                self.model_choice = Some(ModelChoice::Listed(PickerState::new("Models", items, 0)));
                self.advance_to(WizardStep::Model);
            }
            Err(message) => {
                self.error = Some(format!("Could not reach {}: {message}", self.api_url));
            }
        }
        true
    }

    fn advance_to(&mut self, step: WizardStep) {
        self.step = step;
        self.field = match step {
            WizardStep::Name => text_field_with("e.g. dev", &self.name),
            WizardStep::ApiUrl => {
                let url = if self.api_url.is_empty() {
                    DEFAULT_API_URL
                } else {
                    self.api_url.as_str()
                };
                text_field_with(DEFAULT_API_URL, url)
            }
            WizardStep::Model => text_field_with("e.g. llama3", &self.model),
            WizardStep::SystemPrompt => {
                text_field_with("You are a helpful assistant.", &self.system_prompt)
            }
            WizardStep::MakeDefault | WizardStep::Confirm => text_field(""),
        };
    }
}
