//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use std::io::Write;
use std::path::Path;

use clap::Subcommand;
use mapsync::config::ConfigFile;

use super::common::GlobalOptions;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration as INI
    Show,

    /// Write a configuration file with every default spelled out
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand.
pub fn run(options: &GlobalOptions, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(options),
        ConfigCommands::Show => run_show(options),
        ConfigCommands::Init { force } => run_init(options, force),
    }
}

fn run_path(options: &GlobalOptions) -> Result<(), CliError> {
    println!("{}", options.config_path()?.display());
    Ok(())
}

fn run_show(options: &GlobalOptions) -> Result<(), CliError> {
    let config = options.load_config()?;
    let mut stdout = std::io::stdout().lock();
    config.to_ini().write_to(&mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn run_init(options: &GlobalOptions, force: bool) -> Result<(), CliError> {
    let path = options.config_path()?;
    init_file(&path, force)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn init_file(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::InvalidArgument(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    ConfigFile::default().save_to(path)?;
    Ok(())
}
