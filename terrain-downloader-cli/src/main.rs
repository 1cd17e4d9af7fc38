//! terrain-downloader CLI - Command-line interface
//!
//! Plans and downloads quantized-mesh terrain tiles for a geographic
//! rectangle into a local, resumable store.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::common::PlanningArgs;
use commands::download::DownloadArgs;
use error::CliError;
use runner::CliRunner;
use terrain_downloader::config::config_file_path;

#[derive(Parser)]
#[command(name = "terrain-downloader")]
#[command(version, about = "Download quantized-mesh terrain tiles for offline use", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.terrain-downloader/config.ini
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Init {
        /// Replace an existing file with the defaults
        #[arg(long)]
        force: bool,
    },

    /// Estimate tile count and disk usage of a selection
    Estimate(PlanningArgs),

    /// Show the tile ranges planned for each level
    Plan(PlanningArgs),

    /// Download every tile of a selection into the store
    Download(DownloadArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        e.exit();
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    if let Commands::Init { force } = cli.command {
        let path = cli.config.unwrap_or_else(config_file_path);
        return commands::init::run(&path, force);
    }

    let runner = CliRunner::new(cli.config.as_deref(), cli.verbose)?;
    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Estimate(args) => commands::estimate::run(&runner, args),
        Commands::Plan(args) => commands::plan::run(&runner, args),
        Commands::Download(args) => commands::download::run(&runner, args),
    }
}
