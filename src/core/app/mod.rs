use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::config::Persona;
use crate::core::client::ApiConnector;
use crate::core::persona::PersonaStore;

pub mod actions;
pub mod chat;
pub mod input;
pub mod picker;
pub mod wizard;

pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
pub use chat::{ChatView, SubmitOutcome};
pub use picker::{PickerItem, PickerState};
pub use wizard::{PersonaWizard, WizardStep};

/// Which screen is showing. Each variant owns the state for that screen,
/// built fresh on entry and dropped on exit.
pub enum AppState {
    Main,
    PersonaList(PickerState),
    PersonaCreate(PersonaWizard),
    Chat(ChatView),
}

impl AppState {
    pub fn name(&self) -> &'static str {
        match self {
            AppState::Main => "main",
            AppState::PersonaList(_) => "persona-list",
            AppState::PersonaCreate(_) => "persona-create",
            AppState::Chat(_) => "chat",
        }
    }
}

/// State that outlives individual screens.
pub struct SessionContext {
    pub store: PersonaStore,
    pub active_persona: Option<Persona>,
    pub connector: Arc<dyn ApiConnector>,
    pub status: Option<String>,
    pub exit_requested: bool,
    next_check_id: u64,
}

impl SessionContext {
    pub fn new(
        store: PersonaStore,
        connector: Arc<dyn ApiConnector>,
        active_persona: Option<Persona>,
    ) -> Self {
        Self {
            store,
            active_persona,
            connector,
            status: None,
            exit_requested: false,
            next_check_id: 0,
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// Ids are unique for the whole session, so a result that arrives after
    /// its wizard was discarded can never match a newer one.
    pub fn next_check_id(&mut self) -> u64 {
        self.next_check_id += 1;
        self.next_check_id
    }
}

pub struct App {
    pub state: AppState,
    pub session: SessionContext,
}

impl App {
    /// Start on the main screen, or in persona creation when there is no
    /// config file yet.
    pub fn new(session: SessionContext) -> Self {
        let mut app = Self {
            state: AppState::Main,
            session,
        };
        if !app.session.store.exists_on_disk() {
            app.enter_persona_create();
            app.session
                .set_status("Welcome! Let's set up your first persona.");
        }
        app
    }

    pub fn should_quit(&self) -> bool {
        self.session.exit_requested
    }

    /// Fold any streamed output that is ready into the chat transcript.
    pub fn poll_streams(&mut self) -> bool {
        match &mut self.state {
            AppState::Chat(chat) => chat.poll_stream(),
            _ => false,
        }
    }

    fn transition(&mut self, next: AppState) {
        debug!(from = self.state.name(), to = next.name(), "state transition");
        self.state = next;
    }

    /// Back to the main screen. The persona store is re-read so edits made
    /// outside the app show up; a malformed file keeps what was loaded.
    pub fn enter_main(&mut self) {
        self.transition(AppState::Main);

        if let Err(err) = self.session.store.reload() {
            warn!(error = %err, "config reload failed");
            self.session.set_status(err.to_string());
            return;
        }

        if let Some(active) = &self.session.active_persona {
            if let Some(fresh) = self.session.store.find(&active.name) {
                self.session.active_persona = Some(fresh);
            }
        }
    }

    pub fn enter_chat(&mut self) {
        let Some(persona) = self.session.active_persona.clone() else {
            self.session
                .set_status("No persona selected. Press r to pick one or n to create one.");
            return;
        };

        let api = self.session.connector.connect_persona(&persona);
        self.transition(AppState::Chat(ChatView::new(persona, api)));
    }

    pub fn enter_persona_list(&mut self) {
        let active = self.session.active_persona.as_ref().map(|p| p.name.as_str());
        let default = self.session.store.default_name();

        let mut selected = 0;
        let items = self
            .session
            .store
            .list()
            .iter()
            .enumerate()
            .map(|(index, persona)| {
                if Some(persona.name.as_str()) == active {
                    selected = index;
                }
                let mut label = format!("{}  ({} @ {})", persona.name, persona.model, persona.api_url);
                if Some(persona.name.as_str()) == default {
                    label.push_str("  [default]");
                }
                PickerItem::new(persona.name.clone(), label)
            })
            .collect();

        self.transition(AppState::PersonaList(PickerState::new(
            "Personas",
            items,
            selected,
        )));
    }

    pub fn enter_persona_create(&mut self) {
        let make_default = self.session.store.default_persona().is_none();
        self.transition(AppState::PersonaCreate(PersonaWizard::new(make_default)));
    }

    /// Persona creation with `name` filled in, used when a persona asked for
    /// on the command line is not in the store.
    pub fn enter_persona_create_named(&mut self, name: &str) {
        let make_default = self.session.store.default_persona().is_none();
        self.transition(AppState::PersonaCreate(PersonaWizard::with_name(name, make_default)));
        self.session
            .set_status(format!("Persona '{name}' does not exist yet. Let's create it."));
    }
}
