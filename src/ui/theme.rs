use ratatui::style::{Color, Modifier, Style};

use crate::core::message::TranscriptRole;

#[derive(Debug, Clone)]
pub struct Theme {
    pub background_color: Color,

    // Transcript
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_prefix_style: Style,
    pub assistant_text_style: Style,
    pub system_text_style: Style,
    pub app_error_style: Style,

    // Chrome
    pub title_style: Style,
    pub menu_key_style: Style,
    pub help_style: Style,
    pub status_style: Style,
    pub error_style: Style,
    pub streaming_indicator_style: Style,
    pub selection_highlight_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub input_text_style: Style,
}

// Catppuccin Frappé.
const BASE: Color = Color::Rgb(0x30, 0x34, 0x46);
const SURFACE0: Color = Color::Rgb(0x41, 0x45, 0x59);
const TEXT: Color = Color::Rgb(0xc6, 0xd0, 0xf5);
const SUBTEXT0: Color = Color::Rgb(0xa5, 0xad, 0xce);
const OVERLAY1: Color = Color::Rgb(0x83, 0x8b, 0xa7);
const MAUVE: Color = Color::Rgb(0xca, 0x9e, 0xe6);
const PEACH: Color = Color::Rgb(0xef, 0x9f, 0x76);
const BLUE: Color = Color::Rgb(0x8c, 0xaa, 0xee);
const RED: Color = Color::Rgb(0xe7, 0x82, 0x84);

impl Default for Theme {
    fn default() -> Self {
        Self::frappe()
    }
}

impl Theme {
    pub fn frappe() -> Self {
        Theme {
            background_color: BASE,

            user_prefix_style: Style::default().fg(BLUE).add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(TEXT),
            assistant_prefix_style: Style::default().fg(MAUVE).add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(TEXT),
            system_text_style: Style::default().fg(OVERLAY1).add_modifier(Modifier::ITALIC),
            app_error_style: Style::default().fg(RED),

            title_style: Style::default().fg(MAUVE).add_modifier(Modifier::BOLD),
            menu_key_style: Style::default().fg(PEACH).add_modifier(Modifier::BOLD),
            help_style: Style::default().fg(OVERLAY1),
            status_style: Style::default().fg(SUBTEXT0),
            error_style: Style::default().fg(RED),
            streaming_indicator_style: Style::default().fg(PEACH),
            selection_highlight_style: Style::default().bg(SURFACE0).fg(MAUVE),
            input_border_style: Style::default().fg(MAUVE),
            input_title_style: Style::default().fg(SUBTEXT0),
            input_text_style: Style::default().fg(TEXT),
        }
    }

    pub fn prefix_style(&self, role: TranscriptRole) -> Style {
        match role {
            TranscriptRole::User => self.user_prefix_style,
            TranscriptRole::Assistant => self.assistant_prefix_style,
            _ => self.text_style(role).add_modifier(Modifier::BOLD),
        }
    }

    pub fn text_style(&self, role: TranscriptRole) -> Style {
        match role {
            TranscriptRole::System => self.system_text_style,
            TranscriptRole::User => self.user_text_style,
            TranscriptRole::Assistant => self.assistant_text_style,
            TranscriptRole::AppError => self.app_error_style,
        }
    }
}
