use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use smkt_clear::ClearingConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "smkt",
    author,
    version,
    about = "Smart-market offer/bid clearing",
    long_about = None
)]
pub struct Cli {
    /// Set the logging level (overrides `[logging] level` from the config file)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Configuration file (TOML)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert offers and bids into updated generator limits and cost curves
    Clear(ClearArgs),
    /// Show generator records and cost curves of a case
    Inspect {
        /// MATPOWER case file (.m)
        #[arg(value_hint = ValueHint::FilePath)]
        case: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// MATPOWER case file (.m)
    #[arg(value_hint = ValueHint::FilePath)]
    pub case: PathBuf,

    /// Offer/bid submission file (.json or .toml)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub submissions: PathBuf,

    /// Write the cleared case here
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Write a JSON clearing report here
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub report: Option<PathBuf>,

    /// Fail if any diagnostic is raised
    #[arg(long, overrides_with = "no_strict")]
    pub strict: bool,

    /// Return a best-effort result even with diagnostics (overrides `[clearing] strict`)
    #[arg(long, overrides_with = "strict")]
    pub no_strict: bool,

    /// Clear units one at a time instead of in parallel
    #[arg(long, overrides_with = "parallel")]
    pub serial: bool,

    /// Clear units in parallel (overrides `[clearing] parallel = false`)
    #[arg(long, overrides_with = "serial")]
    pub parallel: bool,

    /// Output format for the unit summary
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl ClearArgs {
    /// Clearing options with command-line flags applied over `base`
    pub fn clearing_config(&self, base: &ClearingConfig) -> ClearingConfig {
        let flag = |on: bool, off: bool, default: bool| match (on, off) {
            (true, _) => true,
            (_, true) => false,
            _ => default,
        };
        ClearingConfig {
            strict: flag(self.strict, self.no_strict, base.strict),
            parallel: flag(self.parallel, self.serial, base.parallel),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Build the clap command (used for help/usage checks)
pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
