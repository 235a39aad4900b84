//! Terminal event loop driving the app.

pub mod event_loop;
pub mod executors;
pub mod keybindings;
pub mod lifecycle;

pub use event_loop::run_tui;
