mod chat;
mod main_menu;
mod persona_create;
mod persona_list;

use tokio::sync::mpsc;
use tui_textarea::Input;

use super::{App, AppState};

pub use chat::{transcript_viewport, CHAT_CHROME_ROWS};

pub enum AppAction {
    OpenChat,
    OpenPersonaList,
    OpenPersonaCreate,
    BackToMain,
    Quit,
    PickerMoveUp,
    PickerMoveDown,
    PickerApplySelection,
    SubmitInput,
    TextInput(Input),
    Paste { text: String },
    ScrollLines { lines: i32 },
    ScrollPages { pages: i32 },
    ScrollToBottom,
    OpenEditor,
    EditorComposed { text: Option<String> },
    EndpointChecked {
        check_id: u64,
        result: Result<Vec<String>, String>,
    },
    SetStatus { message: String },
    ClearStatus,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

/// Lets background tasks hand results back to the UI loop.
#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction, ctx: AppActionContext) {
        let _ = self.tx.send(AppActionEnvelope {
            action,
            context: ctx,
        });
    }
}

/// Side effects that need the terminal or the network, run by the event
/// loop after the state change is applied.
#[derive(Debug, PartialEq, Eq)]
pub enum AppCommand {
    VerifyEndpoint { url: String, check_id: u64 },
    ComposeInEditor { initial: String },
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        if let Some(cmd) = apply_action(app, envelope.action, envelope.context) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Option<AppCommand> {
    match action {
        AppAction::SetStatus { message } => {
            app.session.set_status(message);
            return None;
        }
        AppAction::ClearStatus => {
            app.session.clear_status();
            return None;
        }
        AppAction::BackToMain => {
            if !matches!(app.state, AppState::Main) {
                app.session.clear_status();
                app.enter_main();
            }
            return None;
        }
        _ => {}
    }

    match &app.state {
        AppState::Main => main_menu::handle_main_action(app, action, ctx),
        AppState::PersonaList(_) => persona_list::handle_persona_list_action(app, action, ctx),
        AppState::PersonaCreate(_) => {
            persona_create::handle_persona_create_action(app, action, ctx)
        }
        AppState::Chat(_) => chat::handle_chat_action(app, action, ctx),
    }
}
