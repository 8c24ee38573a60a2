pub mod cli;
pub mod config;

pub use cli::{build_cli_command, ClearArgs, Cli, Commands, OutputFormat};
pub use config::{load_config, SmktConfig};
