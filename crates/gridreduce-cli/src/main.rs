use clap::Parser;
use gridreduce_cli::{Cli, Commands, Config};
use gridreduce_core::Diagnostics;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn run(cli: &Cli) -> anyhow::Result<Diagnostics> {
    let config = Config::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Regions {
            regions,
            out,
            network_out,
        } => {
            info!("Building bus regions from {}", regions.network.display());
            commands::regions::handle(regions, out, network_out.as_deref(), &config)
        }
        Commands::Simplify {
            network,
            simplify,
            out,
        } => {
            info!("Simplifying network {}", network.display());
            commands::simplify::handle(network, simplify, out, &config)
        }
        Commands::Run {
            regions,
            simplify,
            out,
        } => {
            info!("Running regions and simplification into {}", out.display());
            commands::run::handle(regions, simplify, out, &config)
        }
        Commands::Inspect { network, format } => commands::inspect::handle(network, *format),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install log subscriber: {err}");
    }

    match run(&cli) {
        Ok(diagnostics) => {
            if !diagnostics.is_empty() {
                warn!("{}", diagnostics.summary());
                eprint!("{diagnostics}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
