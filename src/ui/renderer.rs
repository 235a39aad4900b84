use crate::core::app::wizard::{ModelChoice, WizardStep, WIZARD_STEPS};
use crate::core::app::{App, AppState, ChatView, PersonaWizard, PickerState};
use crate::core::text_wrapping::transcript_lines;
use crate::ui::theme::Theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

pub fn ui(f: &mut Frame, app: &App, theme: &Theme) {
    f.render_widget(
        Block::default().style(Style::default().bg(theme.background_color)),
        f.area(),
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(f.area());

    match &app.state {
        AppState::Main => render_main(f, chunks[0], app, theme),
        AppState::PersonaList(picker) => render_persona_list(f, chunks[0], picker, theme),
        AppState::PersonaCreate(wizard) => render_wizard(f, chunks[0], wizard, theme),
        AppState::Chat(chat) => render_chat(f, chunks[0], chat, theme),
    }

    let status = app.session.status.as_deref().unwrap_or_default();
    f.render_widget(
        Paragraph::new(Span::styled(status, theme.status_style)),
        chunks[1],
    );
}

fn title_line<'a>(text: impl Into<String>, theme: &Theme) -> Line<'a> {
    Line::from(Span::styled(text.into(), theme.title_style))
}

fn render_main(f: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let mut lines = vec![
        title_line(format!("meh v{}", env!("CARGO_PKG_VERSION")), theme),
        Line::default(),
    ];

    match &app.session.active_persona {
        Some(persona) => lines.push(Line::from(vec![
            Span::styled("Persona: ", theme.help_style),
            Span::styled(persona.name.clone(), theme.assistant_prefix_style),
            Span::styled(
                format!("  {} @ {}", persona.model, persona.api_url),
                theme.help_style,
            ),
        ])),
        None => lines.push(Line::from(Span::styled(
            "No persona selected",
            theme.help_style,
        ))),
    }
    lines.push(Line::default());

    for (key, label) in [
        ("c", "chat"),
        ("r", "choose persona"),
        ("n", "new persona"),
        ("q", "quit"),
    ] {
        lines.push(Line::from(vec![
            Span::styled(format!("  {key}  "), theme.menu_key_style),
            Span::styled(label, theme.user_text_style),
        ]));
    }

    f.render_widget(Paragraph::new(lines), area);
}

fn render_picker(f: &mut Frame, area: Rect, picker: &PickerState, theme: &Theme) {
    let items: Vec<ListItem> = picker
        .items
        .iter()
        .map(|item| ListItem::new(Span::styled(item.label.clone(), theme.user_text_style)))
        .collect();

    let list = List::new(items)
        .highlight_style(theme.selection_highlight_style)
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(picker.selected));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_persona_list(f: &mut Frame, area: Rect, picker: &PickerState, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    f.render_widget(Paragraph::new(title_line(picker.title.clone(), theme)), chunks[0]);
    if picker.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(
                "No personas yet. Press Esc, then n to create one.",
                theme.help_style,
            )),
            chunks[1],
        );
    } else {
        render_picker(f, chunks[1], picker, theme);
    }
    f.render_widget(
        Paragraph::new(Span::styled(
            "↑/↓ move · Enter select · Esc back",
            theme.help_style,
        )),
        chunks[2],
    );
}

fn render_wizard(f: &mut Frame, area: Rect, wizard: &PersonaWizard, theme: &Theme) {
    let step = wizard.step();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(area);

    let title = format!(
        "New persona ({}/{}): {}",
        step.number(),
        WIZARD_STEPS,
        step.title()
    );
    f.render_widget(Paragraph::new(title_line(title, theme)), chunks[0]);

    let body = chunks[1];
    match step {
        WizardStep::Model => match wizard.model_choice() {
            Some(ModelChoice::Listed(picker)) => render_picker(f, body, picker, theme),
            _ => render_field(f, body, wizard, theme),
        },
        WizardStep::MakeDefault => {
            let (yes, no) = if wizard.make_default() {
                (theme.selection_highlight_style, theme.help_style)
            } else {
                (theme.help_style, theme.selection_highlight_style)
            };
            f.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled(" Yes ", yes),
                    Span::raw("  "),
                    Span::styled(" No ", no),
                ])),
                body,
            );
        }
        WizardStep::Confirm => {
            let draft = wizard.draft();
            let row = |label: &str, value: String| {
                Line::from(vec![
                    Span::styled(format!("{label:<15}"), theme.help_style),
                    Span::styled(value, theme.user_text_style),
                ])
            };
            let lines = vec![
                row("Name", draft.name.clone()),
                row("API URL", draft.api_url.clone()),
                row("Model", draft.model.clone()),
                row(
                    "System prompt",
                    draft.system_prompt().unwrap_or("(none)").to_string(),
                ),
                row(
                    "Default",
                    if wizard.make_default() { "yes" } else { "no" }.to_string(),
                ),
            ];
            f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), body);
        }
        WizardStep::Name | WizardStep::ApiUrl | WizardStep::SystemPrompt => {
            render_field(f, body, wizard, theme)
        }
    }

    let message = if wizard.is_checking() {
        Span::styled("Checking endpoint…", theme.streaming_indicator_style)
    } else if let Some(error) = wizard.error() {
        Span::styled(error.to_string(), theme.error_style)
    } else {
        Span::raw("")
    };
    f.render_widget(Paragraph::new(message).wrap(Wrap { trim: true }), chunks[2]);

    let help = match step {
        WizardStep::Model if matches!(wizard.model_choice(), Some(ModelChoice::Listed(_))) => {
            "↑/↓ choose · Enter next · Esc cancel"
        }
        WizardStep::MakeDefault => "y/n toggle · Enter next · Esc cancel",
        WizardStep::Confirm => "Enter save · Esc cancel",
        _ => "Enter next · Esc cancel",
    };
    f.render_widget(
        Paragraph::new(Span::styled(help, theme.help_style)),
        chunks[3],
    );
}

fn render_field(f: &mut Frame, area: Rect, wizard: &PersonaWizard, theme: &Theme) {
    let area = Rect {
        height: area.height.min(3),
        ..area
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.input_border_style);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(wizard.field(), inner);
}

fn render_chat(f: &mut Frame, area: Rect, chat: &ChatView, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let persona = chat.persona();
    let mut title = vec![Span::styled(
        format!("{} · {}", persona.name, persona.model),
        theme.title_style,
    )];
    if chat.is_busy() {
        title.push(Span::styled("  ● streaming", theme.streaming_indicator_style));
    }
    f.render_widget(Paragraph::new(Line::from(title)), chunks[0]);

    let transcript = chunks[1];
    let laid_out = transcript_lines(chat.transcript(), usize::from(transcript.width.max(1)));
    let height = usize::from(transcript.height);
    let max_offset = laid_out.len().saturating_sub(height);
    let top = max_offset - chat.scroll_from_bottom().min(max_offset);

    let lines: Vec<Line> = laid_out
        .into_iter()
        .map(|line| {
            let style = if line.is_header {
                theme.prefix_style(line.role)
            } else {
                theme.text_style(line.role)
            };
            Line::from(Span::styled(line.text, style))
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).scroll((u16::try_from(top).unwrap_or(u16::MAX), 0)),
        transcript,
    );

    let input_title = if chat.is_busy() {
        "Waiting for reply · PgUp/PgDn scroll · Esc back"
    } else {
        "Enter send · Ctrl+E editor · PgUp/PgDn scroll · Esc back"
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.input_border_style)
        .title(Span::styled(input_title, theme.input_title_style));
    let inner = block.inner(chunks[2]);
    f.render_widget(block, chunks[2]);
    f.render_widget(chat.input(), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{create_test_app, test_persona, FakeConnector};
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn rendered_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 16)).unwrap();
        terminal
            .draw(|f| ui(f, app, &Theme::default()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(usize::from(buffer.area.width))
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn main_screen_shows_persona_and_menu() {
        let temp_dir = TempDir::new().unwrap();
        let app = create_test_app(&temp_dir, &[test_persona("dev")], FakeConnector::default());

        let text = rendered_text(&app);
        assert!(text.contains("Persona: dev"));
        assert!(text.contains("new persona"));
    }

    #[test]
    fn first_run_shows_wizard_step() {
        let temp_dir = TempDir::new().unwrap();
        let app = create_test_app(&temp_dir, &[], FakeConnector::default());

        let text = rendered_text(&app);
        assert!(text.contains("New persona (1/6): Persona name"));
    }
}
