//! compenv CLI
//!
//! A small compiler driver over the environment facade

use clap::{Parser, Subcommand};
use compenv_core::logging_facility::{self, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "compenv")]
#[command(about = "compenv - compiler environment lifecycle driver", long_about = None)]
struct Cli {
    /// Log lifecycle events to stderr (RUST_LOG overrides the filter)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON instead of human-readable text
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Count the lines of source files
    Lines(commands::lines::LinesArgs),
    /// List the extension points a fresh environment declares
    Points(commands::points::PointsArgs),
}

fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logging_facility::init(Profile::Production);
    } else if cli.verbose {
        logging_facility::init(Profile::Development);
    }

    let result = match cli.command {
        Commands::Lines(args) => commands::lines::execute(args),
        Commands::Points(args) => commands::points::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
