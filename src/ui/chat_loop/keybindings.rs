//! Key to action mapping for each screen.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::Input;

use crate::core::app::{AppAction, AppState};

fn is_ctrl(key: &KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(ch)
}

/// Translate a key press into an action for the current screen.
pub fn map_key(state: &AppState, key: KeyEvent) -> Option<AppAction> {
    match state {
        AppState::Main => map_main_key(key),
        AppState::PersonaList(_) => map_persona_list_key(key),
        AppState::PersonaCreate(_) => map_persona_create_key(key),
        AppState::Chat(_) => map_chat_key(key),
    }
}

fn map_main_key(key: KeyEvent) -> Option<AppAction> {
    if is_ctrl(&key, 'c') {
        return Some(AppAction::Quit);
    }
    match key.code {
        KeyCode::Char('c') => Some(AppAction::OpenChat),
        KeyCode::Char('r') => Some(AppAction::OpenPersonaList),
        KeyCode::Char('n') => Some(AppAction::OpenPersonaCreate),
        KeyCode::Char('q') => Some(AppAction::Quit),
        _ => None,
    }
}

fn map_persona_list_key(key: KeyEvent) -> Option<AppAction> {
    if is_ctrl(&key, 'c') {
        return Some(AppAction::BackToMain);
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(AppAction::BackToMain),
        KeyCode::Up | KeyCode::Char('k') => Some(AppAction::PickerMoveUp),
        KeyCode::Down | KeyCode::Char('j') => Some(AppAction::PickerMoveDown),
        KeyCode::Enter => Some(AppAction::PickerApplySelection),
        _ => None,
    }
}

fn map_persona_create_key(key: KeyEvent) -> Option<AppAction> {
    if is_ctrl(&key, 'c') {
        return Some(AppAction::BackToMain);
    }
    match key.code {
        KeyCode::Esc => Some(AppAction::BackToMain),
        KeyCode::Enter => Some(AppAction::SubmitInput),
        _ => Some(AppAction::TextInput(Input::from(key))),
    }
}

fn map_chat_key(key: KeyEvent) -> Option<AppAction> {
    if is_ctrl(&key, 'c') {
        return Some(AppAction::BackToMain);
    }
    if is_ctrl(&key, 'e') {
        return Some(AppAction::OpenEditor);
    }
    match key.code {
        KeyCode::Esc => Some(AppAction::BackToMain),
        KeyCode::Enter => Some(AppAction::SubmitInput),
        KeyCode::PageUp => Some(AppAction::ScrollPages { pages: 1 }),
        KeyCode::PageDown => Some(AppAction::ScrollPages { pages: -1 }),
        KeyCode::Up if key.modifiers.contains(KeyModifiers::SHIFT) => {
            Some(AppAction::ScrollLines { lines: 1 })
        }
        KeyCode::Down if key.modifiers.contains(KeyModifiers::SHIFT) => {
            Some(AppAction::ScrollLines { lines: -1 })
        }
        KeyCode::End if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(AppAction::ScrollToBottom)
        }
        _ => Some(AppAction::TextInput(Input::from(key))),
    }
}
