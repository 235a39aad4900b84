//! meh is a terminal chat client for local generative-text services.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns personas, the config file, the app state machine, and
//!   streaming orchestration.
//! - [`ui`] renders the terminal interface and runs the event loop.
//! - [`api`] defines the request and response payloads of the service.
//! - [`cli`] parses arguments and runs one-shot queries.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
