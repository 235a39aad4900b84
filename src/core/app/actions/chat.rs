use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::app::chat::SubmitOutcome;
use crate::core::app::input::field_text;
use crate::core::app::AppState;

/// Rows of the chat screen not used by the transcript: title, a bordered
/// one-line input, and the status line.
pub const CHAT_CHROME_ROWS: u16 = 5;

pub fn transcript_viewport(ctx: AppActionContext) -> (usize, usize) {
    (
        usize::from(ctx.term_width.max(1)),
        usize::from(ctx.term_height.saturating_sub(CHAT_CHROME_ROWS).max(1)),
    )
}

pub(super) fn handle_chat_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    let AppState::Chat(chat) = &mut app.state else {
        return None;
    };
    let (width, height) = transcript_viewport(ctx);

    match action {
        AppAction::TextInput(input) => {
            chat.handle_input(input);
        }
        AppAction::Paste { text } => {
            chat.paste(&text);
        }
        AppAction::SubmitInput => {
            if chat.submit_input() == SubmitOutcome::Busy {
                app.session
                    .set_status("Still waiting for the previous reply");
            } else {
                app.session.clear_status();
            }
        }
        AppAction::ScrollLines { lines } => chat.scroll_by(lines, width, height),
        AppAction::ScrollPages { pages } => {
            let page = i32::try_from(height).unwrap_or(i32::MAX);
            chat.scroll_by(pages.saturating_mul(page), width, height);
        }
        AppAction::ScrollToBottom => chat.scroll_to_bottom(),
        AppAction::OpenEditor => {
            return Some(AppCommand::ComposeInEditor {
                initial: field_text(chat.input()),
            });
        }
        AppAction::EditorComposed { text: Some(text) } => match chat.submit(&text) {
            SubmitOutcome::Busy => app
                .session
                .set_status("Still waiting for the previous reply"),
            SubmitOutcome::Empty => app.session.set_status("Editor text was empty; nothing sent"),
            SubmitOutcome::Started => app.session.clear_status(),
        },
        _ => {}
    }
    None
}
