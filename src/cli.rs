use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::persist::StrategyChoice;

#[derive(Debug, Parser)]
#[command(author, version, about = "Load nested user records from CSV into SQLite", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// SQLite database file (overrides the config file)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse a CSV file and insert its records
    Load(LoadArgs),
    /// Report the age distribution of stored users
    Distribution(DistributionArgs),
    /// Print every stored user
    List(ListArgs),
    /// Delete every stored user
    Clear,
    /// Print the number of stored users
    Count,
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Input CSV file ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Persistence strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyChoice>,
    /// Record count above which the bulk path is used
    #[arg(long = "bulk-threshold")]
    pub bulk_threshold: Option<usize>,
    /// Records per set-based insert on the bulk path
    #[arg(long = "chunk-size", value_parser = clap::value_parser!(u32).range(1..))]
    pub chunk_size: Option<u32>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct DistributionArgs {
    /// Render as a text table instead of JSON
    #[arg(long = "table")]
    pub table: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum ListFormat {
    #[default]
    Json,
    Csv,
    Table,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = ListFormat::Json)]
    pub format: ListFormat,
}
