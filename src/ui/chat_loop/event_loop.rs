use std::{
    error::Error,
    io,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use ratatui::layout::Size;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::executors::spawn_endpoint_check;
use super::keybindings::map_key;
use super::lifecycle::{resume_terminal, restore_terminal, setup_terminal, suspend_terminal, Tui};
use crate::core::app::{
    apply_action, apply_actions, App, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;
use crate::utils::editor::compose_in_editor;

pub enum UiEvent {
    Crossterm(Event),
}

const MAX_FPS: u64 = 60;

fn try_draw_frame(
    app: &App,
    terminal: &mut Tui,
    theme: &Theme,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    terminal.draw(|f| ui(f, app, theme))?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

fn context_for(size: Size) -> AppActionContext {
    AppActionContext {
        term_width: size.width,
        term_height: size.height,
    }
}

#[derive(Default)]
struct EventProcessingOutcome {
    events_processed: bool,
    request_redraw: bool,
    commands: Vec<AppCommand>,
}

/// Apply terminal input to the app. Keys are mapped against the state as it
/// is after the previous key, so a burst of typing lands on the right screen.
fn process_ui_events(
    app: &mut App,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    ctx: AppActionContext,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome::default();

    while let Ok(UiEvent::Crossterm(ev)) = event_rx.try_recv() {
        outcome.events_processed = true;
        let action = match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => map_key(&app.state, key),
            Event::Paste(text) => Some(AppAction::Paste { text }),
            Event::Resize(_, _) => {
                outcome.request_redraw = true;
                None
            }
            _ => None,
        };

        if let Some(action) = action {
            outcome.request_redraw = true;
            outcome.commands.extend(apply_action(app, action, ctx));
        }

        if app.should_quit() {
            break;
        }
    }

    outcome
}

fn drain_action_queue(
    app: &mut App,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> Option<Vec<AppCommand>> {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return None;
    }

    Some(apply_actions(app, pending))
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => continue,
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

/// Suspend the UI, let the user write a message in their editor, and feed
/// the result back as an action.
fn run_editor(terminal: &mut Tui, initial: &str) -> Result<AppAction, Box<dyn Error>> {
    suspend_terminal(terminal)?;
    let composed = compose_in_editor(initial);
    resume_terminal(terminal)?;

    Ok(match composed {
        Ok(text) => AppAction::EditorComposed { text },
        Err(err) => {
            warn!(error = %err, "external editor failed");
            AppAction::SetStatus {
                message: format!("Editor error: {err}"),
            }
        }
    })
}

pub async fn run_tui(mut app: App) -> Result<(), Box<dyn Error>> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let dispatcher = AppActionDispatcher::new(action_tx);
    let theme = Theme::default();

    let mut terminal = setup_terminal()?;

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let mut event_reader = spawn_event_reader(event_tx.clone());

    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    let result: Result<(), Box<dyn Error>> = 'main_loop: loop {
        if app.should_quit() {
            break Ok(());
        }

        if let Err(err) = try_draw_frame(
            &app,
            &mut terminal,
            &theme,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        ) {
            break Err(err.into());
        }

        let ctx = context_for(terminal.size().unwrap_or_default());

        let outcome = process_ui_events(&mut app, &mut event_rx, ctx);
        if outcome.request_redraw {
            request_redraw = true;
        }

        let streamed = app.poll_streams();
        if streamed {
            request_redraw = true;
        }

        let mut commands = outcome.commands;
        if let Some(queued) = drain_action_queue(&mut app, &mut action_rx) {
            commands.extend(queued);
            request_redraw = true;
        }

        for command in commands {
            debug!(?command, "executing command");
            match command {
                AppCommand::VerifyEndpoint { url, check_id } => {
                    spawn_endpoint_check(
                        app.session.connector.clone(),
                        dispatcher.clone(),
                        url,
                        check_id,
                    );
                }
                AppCommand::ComposeInEditor { initial } => {
                    // The reader would otherwise steal the editor's keystrokes.
                    event_reader.abort();
                    let action = run_editor(&mut terminal, &initial);
                    while event_rx.try_recv().is_ok() {}
                    event_reader = spawn_event_reader(event_tx.clone());
                    match action {
                        Ok(action) => dispatcher.dispatch(action, ctx),
                        Err(err) => break 'main_loop Err(err),
                    }
                    request_redraw = true;
                }
            }
        }

        let idle = !outcome.events_processed && !streamed && !request_redraw;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    event_reader.abort();
    restore_terminal(&mut terminal)?;
    result
}
