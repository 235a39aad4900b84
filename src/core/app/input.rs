use ratatui::style::{Modifier, Style};
use tui_textarea::{CursorMove, Input, Key, TextArea};

use crate::utils::input::sanitize_text_input;

/// A single-line text field with placeholder text.
pub fn text_field(placeholder: &str) -> TextArea<'static> {
    let mut textarea = TextArea::default();
    textarea.set_placeholder_text(placeholder.to_string());
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_style(Style::default().add_modifier(Modifier::DIM));
    textarea
}

pub fn text_field_with(placeholder: &str, text: &str) -> TextArea<'static> {
    let mut textarea = text_field(placeholder);
    textarea.insert_str(text);
    textarea.move_cursor(CursorMove::End);
    textarea
}

pub fn field_text(textarea: &TextArea<'_>) -> String {
    textarea.lines().join("\n")
}

/// Forward a key to a single-line field. Enter never inserts a newline.
pub fn field_input(textarea: &mut TextArea<'_>, input: Input) -> bool {
    if matches!(input.key, Key::Enter) {
        return false;
    }
    textarea.input(input)
}

/// Insert pasted text with control characters removed and newlines folded
/// into spaces.
pub fn field_paste(textarea: &mut TextArea<'_>, text: &str) -> bool {
    textarea.insert_str(sanitize_text_input(text))
}
