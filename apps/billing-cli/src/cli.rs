use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "billing",
    about = "Compute and check the figures of invoices and usage receipts",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to billing.toml in the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log computed figures at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the totals, tax lines and display strings of a document
    Totals(DocumentArgs),
    /// Validate a document and its expected total
    Check(DocumentArgs),
    /// Show the effective configuration, or write it with --init
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DocumentArgs {
    /// Document JSON file; reads stdin when omitted or "-"
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    pub init: bool,
}
