//! Command-line interface parsing and handling
//!
//! With query input `meh` runs a one-shot completion against the chosen
//! persona; otherwise it starts the interactive interface.

pub mod pick_model;
pub mod query;

use std::error::Error;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use crate::cli::pick_model::ensure_model;
use crate::cli::query::{build_prompt, run_query};
use crate::core::app::{App, SessionContext};
use crate::core::client::{ApiConnector, OllamaConnector};
use crate::core::config::{ConfigStore, Persona};
use crate::core::persona::PersonaStore;
use crate::ui::chat_loop::run_tui;
use crate::utils::{editor, logging};

#[derive(Parser, Debug)]
#[command(name = "meh", version)]
#[command(about = "A terminal chat client for local generative-text services")]
#[command(
    long_about = "meh talks to a local Ollama-style service through named personas. \
Each persona bundles an endpoint, a model and an optional system prompt.\n\n\
Run without a query to open the interactive interface. Pass a query, a file, \
or pipe text in to print a single completion.\n\n\
Controls (chat):\n\
  Enter             Send the message\n\
  Ctrl+E            Compose the message in $EDITOR\n\
  PgUp/PgDn         Scroll the transcript\n\
  Esc               Back to the main menu\n\n\
Environment Variables:\n\
  EDITOR            Editor used by --config and Ctrl+E (defaults to vi)\n\
  MEH_LOG           Log filter, for example MEH_LOG=meh=debug"
)]
pub struct Args {
    /// Words of the query to send
    #[arg(value_name = "QUERY")]
    pub query: Vec<String>,

    /// Read the prompt from a file
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Open the config file in $EDITOR and exit
    #[arg(short = 'c', long)]
    pub config: bool,

    /// Persona to use instead of the default
    #[arg(short = 'p', long, value_name = "NAME")]
    pub persona: Option<String>,

    /// Choose the persona's model interactively, save it, and exit
    #[arg(short = 'm', long)]
    pub select_model: bool,

    /// Ask for the whole reply at once instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    /// Write log output to a file
    #[arg(short = 'l', long, value_name = "PATH")]
    pub log: Option<PathBuf>,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let file_contents = args
        .file
        .as_deref()
        .map(|path| {
            std::fs::read_to_string(path)
                .map_err(|err| format!("Error reading {}: {err}", path.display()))
        })
        .transpose()?;
    let prompt = build_prompt(&args.query, file_contents, read_piped_stdin()?);

    let interactive = prompt.is_none() && !args.config && !args.select_model;
    logging::init(args.log.as_deref(), interactive)?;

    let config_store = ConfigStore::open_default()?;

    if args.config {
        return edit_config(config_store.path());
    }

    let mut store = PersonaStore::load(config_store)?;
    let connector = OllamaConnector::new(!args.no_stream);

    if let Some(prompt) = prompt {
        let mut persona = resolve_persona(&store, args.persona.as_deref())?;
        let mut api = connector.connect_persona(&persona);
        ensure_model(
            api.as_mut(),
            &mut store,
            &mut persona,
            args.select_model,
            &mut io::stdin().lock(),
            &mut io::stdout(),
        )
        .await?;
        debug!(persona = %persona.name, model = %persona.model, "running query");
        return run_query(api.as_ref(), &prompt).await;
    }

    if args.select_model {
        let mut persona = resolve_persona(&store, args.persona.as_deref())?;
        let mut api = connector.connect_persona(&persona);
        ensure_model(
            api.as_mut(),
            &mut store,
            &mut persona,
            true,
            &mut io::stdin().lock(),
            &mut io::stdout(),
        )
        .await?;
        println!("Model for persona '{}' set to: {}", persona.name, persona.model);
        return Ok(());
    }

    let requested = args.persona.as_deref();
    let missing = missing_persona(&store, requested).map(str::to_string);
    let active = requested
        .and_then(|name| store.find(name))
        .or_else(|| store.default_persona());
    let session = SessionContext::new(store, Arc::new(connector), active);
    let mut app = App::new(session);
    if let Some(name) = missing {
        app.enter_persona_create_named(&name);
    }
    run_tui(app).await
}

/// The persona asked for with `--persona` when the store does not have it.
fn missing_persona<'a>(store: &PersonaStore, requested: Option<&'a str>) -> Option<&'a str> {
    requested.filter(|name| store.find(name).is_none())
}

/// The persona named on the command line, else the default one.
fn resolve_persona(store: &PersonaStore, requested: Option<&str>) -> Result<Persona, Box<dyn Error>> {
    if !store.exists_on_disk() || store.is_empty() {
        return Err("No personas configured. Run meh without a query to create one.".into());
    }

    match requested {
        Some(name) => store
            .find(name)
            .ok_or_else(|| {
                format!("Persona '{name}' does not exist. Run meh -p {name} to create it.").into()
            }),
        None => store
            .default_persona()
            .ok_or_else(|| "No default persona set. Pass one with --persona.".into()),
    }
}

fn read_piped_stdin() -> Result<Option<String>, Box<dyn Error>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut piped = String::new();
    stdin.lock().read_to_string(&mut piped)?;
    Ok(Some(piped))
}

fn edit_config(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    editor::edit_file(path)
}
