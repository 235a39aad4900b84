//! External editor integration
//!
//! Used to edit the config file (`meh -c`) and to compose longer chat
//! messages from the TUI.

use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::debug;

const FALLBACK_EDITOR: &str = "vi";

/// The user's `$EDITOR`, or `vi` when it is unset or blank.
pub fn editor_command() -> String {
    editor_from(std::env::var("EDITOR").ok())
}

fn editor_from(value: Option<String>) -> String {
    match value {
        Some(editor) if !editor.trim().is_empty() => editor,
        _ => FALLBACK_EDITOR.to_string(),
    }
}

/// Run the editor on `path` and wait for it to exit. `$EDITOR` may carry
/// arguments, as in `code --wait`.
pub fn edit_file(path: &Path) -> Result<(), Box<dyn Error>> {
    let editor = editor_command();
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or(FALLBACK_EDITOR);

    debug!(%editor, path = %path.display(), "launching editor");
    let status = Command::new(program).args(parts).arg(path).status()?;

    if !status.success() {
        return Err(format!("Editor exited with non-zero status: {status}").into());
    }
    Ok(())
}

/// Open `initial` in the editor and return what was saved. Whitespace-only
/// content yields `None`.
pub fn compose_in_editor(initial: &str) -> Result<Option<String>, Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let temp_path = temp_file.path().to_path_buf();

    if !initial.is_empty() {
        fs::write(&temp_path, initial)?;
    }

    edit_file(&temp_path)?;

    let content = fs::read_to_string(&temp_path)?;
    Ok(composed_message(&content))
}

fn composed_message(content: &str) -> Option<String> {
    if content.trim().is_empty() {
        None
    } else {
        Some(content.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_editor_falls_back_to_vi() {
        assert_eq!(editor_from(None), "vi");
        assert_eq!(editor_from(Some("  ".into())), "vi");
        assert_eq!(editor_from(Some("nano".into())), "nano");
    }

    #[test]
    fn composed_message_drops_trailing_newlines_only() {
        assert_eq!(composed_message(" \n\n"), None);
        assert_eq!(
            composed_message("first line\n  indented\n\n").as_deref(),
            Some("first line\n  indented")
        );
    }
}
