//! CLI command definitions and dispatch.

pub mod check;
pub mod dump;
pub mod plan;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ctn_common::config::CtnConfig;
use ctn_sdk::loader::Loader;

/// ctn: compile and inspect service definitions.
#[derive(Parser, Debug)]
#[command(name = ctn_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Directory whose files are importable by relative name (repeatable).
    #[arg(long = "import-dir", global = true)]
    pub import_dirs: Vec<PathBuf>,

    /// Path to a JSON compiler configuration.
    #[arg(long, global = true, env = "CTN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a ctn file and report unresolved references.
    Check(check::CheckArgs),
    /// Print the compiled parameters, aliases and services as JSON.
    Dump(dump::DumpArgs),
    /// Display the order in which services would be instantiated.
    Plan(plan::PlanArgs),
}

impl Cli {
    /// Builds the loader shared by every subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be loaded.
    pub fn loader(&self) -> anyhow::Result<Loader> {
        let config = match &self.config {
            Some(path) => CtnConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => CtnConfig::default(),
        };
        Ok(self
            .import_dirs
            .iter()
            .fold(Loader::new().config(config), |loader, dir| {
                loader.import_dir(dir.clone())
            }))
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let loader = cli.loader()?;
    let mut out = std::io::stdout().lock();
    match cli.command {
        Command::Check(args) => check::execute(&args, &loader, &mut out),
        Command::Dump(args) => dump::execute(&args, &loader, &mut out),
        Command::Plan(args) => plan::execute(&args, &loader, &mut out),
    }
}
