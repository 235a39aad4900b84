//! Word wrapping for the transcript view.
//!
//! The chat screen needs the exact number of visual lines to keep the view
//! pinned to the newest output, so wrapping happens here instead of in the
//! `Paragraph` widget, and the renderer draws the pre-wrapped lines as-is.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::core::message::{Message, TranscriptRole};

/// Wrap `text` to `width` display columns.
///
/// Breaks at spaces when possible and splits words longer than a line.
/// Embedded newlines always start a new line, and an empty input yields one
/// empty line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0usize;

        for word in paragraph.split(' ') {
            let word_width = UnicodeWidthStr::width(word);
            let sep = usize::from(!current.is_empty());

            if current_width + sep + word_width <= width {
                if sep == 1 {
                    current.push(' ');
                }
                current.push_str(word);
                current_width += sep + word_width;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }

            if word_width <= width {
                current.push_str(word);
                current_width = word_width;
                continue;
            }

            for ch in word.chars() {
                let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
                if current_width + ch_width > width && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push(ch);
                current_width += ch_width;
            }
        }

        lines.push(current);
    }

    lines
}

/// One visual line of the transcript and the role it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub role: TranscriptRole,
    pub text: String,
    /// First line of an entry, where the role label is drawn.
    pub is_header: bool,
}

pub fn role_label(role: TranscriptRole) -> &'static str {
    match role {
        TranscriptRole::System => "System",
        TranscriptRole::User => "You",
        TranscriptRole::Assistant => "Assistant",
        TranscriptRole::AppError => "Error",
    }
}

/// Lay out the whole transcript: a label line per entry, its wrapped body,
/// then a blank separator.
pub fn transcript_lines(transcript: &[Message], width: usize) -> Vec<TranscriptLine> {
    let mut lines = Vec::new();
    for message in transcript {
        lines.push(TranscriptLine {
            role: message.role,
            text: role_label(message.role).to_string(),
            is_header: true,
        });
        for text in wrap_text(message.content.trim_end(), width) {
            lines.push(TranscriptLine {
                role: message.role,
                text,
                is_header: false,
            });
        }
        lines.push(TranscriptLine {
            role: message.role,
            text: String::new(),
            is_header: false,
        });
    }
    lines
}
