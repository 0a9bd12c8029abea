//! studio-cli library
//!
//! Exposes the command runner so it can be driven from tests.

pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod error;
pub(crate) mod logger;
pub(crate) mod runner;


pub use cli::Cli;
pub use commands::{Commands, RestoreMode};
pub use error::{CliError, Result as CliResult};
pub use logger::initialize as initialize_logger;
pub use runner::{Runner, build_config};
