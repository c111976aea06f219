//! mapsync CLI - command-line interface
//!
//! Headless lookups and a terminal map surface, all backed by the
//! simulated platform services from the mapsync library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod ui;

use commands::config::ConfigCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "mapsync")]
#[command(version = mapsync::VERSION)]
#[command(about = "Map location and address search playground", long_about = None)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level directive (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reverse-geocode a coordinate
    Resolve {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Autocomplete a query and optionally locate one suggestion
    Search {
        /// Free-text query
        query: String,

        /// Locate the Nth suggestion (1-based)
        #[arg(long)]
        select: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Interactive terminal map
    Demo {
        /// Start latitude (defaults to the configured default location)
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Start longitude (defaults to the configured default location)
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Simulate a user who refuses location access
        #[arg(long)]
        deny_permission: bool,
    },

    /// View or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let options = commands::common::GlobalOptions {
        config_path: cli.config,
        log_level: cli.log_level,
    };

    match cli.command {
        Commands::Resolve { lat, lon, json } => commands::resolve::run(&options, lat, lon, json),
        Commands::Search {
            query,
            select,
            json,
        } => commands::search::run(&options, &query, select, json),
        Commands::Demo {
            lat,
            lon,
            deny_permission,
        } => commands::demo::run(
            &options,
            commands::demo::DemoArgs {
                lat,
                lon,
                deny_permission,
            },
        ),
        Commands::Config(command) => commands::config::run(&options, command),
    }
}
