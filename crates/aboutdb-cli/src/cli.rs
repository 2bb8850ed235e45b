use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "aboutdb",
    about = "AboutDB: embedded object store with secondary indexes",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log every store operation
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML store configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the sample Entry/Variant dataset and show reads and lookups
    Demo,
    /// Execute a script of index/store/link/get/delete/lookup statements
    Run(RunArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Script file, one statement per line
    pub script: PathBuf,
}
