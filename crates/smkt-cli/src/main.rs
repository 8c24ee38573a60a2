use clap::Parser;
use smkt_cli::{load_config, Cli, Commands};
use tracing::{debug, error};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        error!("{:#}", err);
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let level = match cli.log_level {
        Some(level) => level,
        None => config.log_level()?,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(path) = &cli.config {
        debug!("loaded config from {}", path.display());
    }

    match &cli.command {
        Commands::Clear(args) => commands::clear::handle(args, &config),
        Commands::Inspect { case, format } => commands::inspect::handle(case, *format),
    }
}
