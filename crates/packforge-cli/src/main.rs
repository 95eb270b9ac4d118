//! packforge CLI - assemble package contents from compiled project outputs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod logging;
mod pack;

#[derive(Parser)]
#[command(name = "packforge")]
#[command(version)]
#[command(about = "Assemble package contents from compiled project outputs", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the package described by a pack request
    Pack {
        /// Path to the pack request
        #[arg(default_value = pack::REQUEST_FILE)]
        request: PathBuf,

        /// Include debug symbols (.pdb)
        #[arg(long)]
        symbols: bool,

        /// Place build outputs in the tools folder
        #[arg(long)]
        tool: bool,

        /// Override the package version
        #[arg(long = "version", value_name = "VERSION")]
        package_version: Option<String>,

        /// Directory the package manifest is written to
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Target framework to pack for (repeatable)
        #[arg(long = "framework", short = 'f')]
        frameworks: Vec<String>,

        /// Build the package model without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging(&logging::LoggingConfig::resolve(
        cli.log_level.as_deref(),
        cli.log_json,
    ));

    match cli.command {
        Commands::Pack {
            request,
            symbols,
            tool,
            package_version,
            output,
            frameworks,
            dry_run,
        } => {
            let options = pack::PackOptions {
                request,
                symbols,
                tool,
                version: package_version,
                output,
                frameworks,
                dry_run,
            };
            pack::run_pack(&options)?;
        }
    }

    Ok(())
}
