//! Tracing setup.
//!
//! The filter comes from `MEH_LOG` (for example `MEH_LOG=meh=debug`). While
//! the TUI owns the terminal, events only go to a log file when one is
//! given; one-shot queries log warnings to stderr.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "MEH_LOG";

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init(log_file: Option<&Path>, tui: bool) -> Result<(), Box<dyn Error>> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter("info"))
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|err| err as Box<dyn Error>)?;
        }
        None if tui => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter("warn"))
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|err| err as Box<dyn Error>)?;
        }
    }
    Ok(())
}
