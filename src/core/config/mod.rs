pub mod data;
pub mod io;
pub mod store;

pub use data::{Config, Persona};
pub use io::ConfigError;
pub use store::ConfigStore;

#[cfg(test)]
pub mod tests;
