//! Terminal UI layer.
//!
//! [`chat_loop`] owns the terminal and the event loop, [`renderer`] draws
//! one frame from the app state, and [`theme`] holds the colours. Domain
//! logic lives in [`crate::core`].

pub mod chat_loop;
pub mod renderer;
pub mod theme;
