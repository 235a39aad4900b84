pub mod app;
pub mod chat_stream;
pub mod client;
pub mod config;
pub mod message;
pub mod persona;
pub mod text_wrapping;
