// ABOUTME: Library half of the dorxl CLI
// ABOUTME: Builds the session manager from the environment and formats session data for the terminal

pub mod context;
pub mod display;
pub mod error;

pub use context::{build_manager, open_encryption, open_store, StoreKind};
pub use error::{CliError, CliResult};

#[cfg(test)]
mod tests;
