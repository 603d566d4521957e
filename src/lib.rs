pub mod assembler;
pub mod cli;
pub mod config;
pub mod distribution;
pub mod error;
pub mod io_utils;
pub mod persist;
pub mod pipeline;
pub mod record;
pub mod store;
pub mod table;
pub mod tokenizer;

use std::{env, io::Write, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, DistributionArgs, ListArgs, ListFormat, LoadArgs},
    config::LoaderConfig,
    pipeline::ProcessOptions,
    store::{StoredUser, UserStore},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_user_loader", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => LoaderConfig::load(path)?,
        None => LoaderConfig::default(),
    };
    if let Some(database) = cli.database {
        config.database = Some(database);
    }
    debug!("Effective configuration: {:?}", config);
    if config.database.is_none() {
        warn!("No database configured; using a temporary in-memory store");
    }

    match cli.command {
        Commands::Load(args) => handle_load(config, &args),
        Commands::Distribution(args) => handle_distribution(&config, &args),
        Commands::List(args) => handle_list(&config, &args),
        Commands::Clear => {
            let mut store = open_store(&config)?;
            let deleted = pipeline::clear_all(&mut store).context("Clearing stored users")?;
            println!("{deleted}");
            Ok(())
        }
        Commands::Count => {
            let store = open_store(&config)?;
            println!("{}", pipeline::count(&store).context("Counting stored users")?);
            Ok(())
        }
    }
}

fn open_store(config: &LoaderConfig) -> Result<UserStore> {
    UserStore::open(&config.store_config())
        .with_context(|| format!("Opening database {:?}", config.database))
}

fn handle_load(mut config: LoaderConfig, args: &LoadArgs) -> Result<()> {
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(threshold) = args.bulk_threshold {
        config.bulk_threshold = threshold;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size as usize;
    }
    if args.input_encoding.is_some() {
        config.input_encoding = args.input_encoding.clone();
    }

    let options = ProcessOptions {
        encoding: io_utils::resolve_encoding(config.input_encoding.as_deref())?,
        strategy: config.strategy,
        bulk_threshold: config.bulk_threshold,
        chunk_size: config.chunk_size,
    };
    info!(
        "Loading '{}' with {} encoding",
        args.input.display(),
        options.encoding.name()
    );
    let mut store = open_store(&config)?;
    let summary = pipeline::process(&mut store, &args.input, &options)
        .with_context(|| format!("Loading {:?}", args.input))?;
    info!(
        "Loaded {} of {} record(s) via the {} path ({} failed)",
        summary.inserted, summary.total_records, summary.strategy, summary.failed
    );
    print_json(&summary)
}

fn handle_distribution(config: &LoaderConfig, args: &DistributionArgs) -> Result<()> {
    let store = open_store(config)?;
    let report = pipeline::distribution(&store).context("Computing age distribution")?;
    if args.table {
        let headers = ["bucket", "count", "percent"].map(String::from);
        table::print_table(&headers, &report.rows());
        println!("total: {}", report.total);
        Ok(())
    } else {
        print_json(&report)
    }
}

fn handle_list(config: &LoaderConfig, args: &ListArgs) -> Result<()> {
    let store = open_store(config)?;
    let users = pipeline::all_records(&store).context("Reading stored users")?;
    match args.format {
        ListFormat::Json => print_json(&users),
        ListFormat::Csv => {
            let mut writer = io_utils::stdout_csv_writer();
            writer.write_record(USER_COLUMNS)?;
            for user in &users {
                writer
                    .write_record(user_cells(user))
                    .with_context(|| format!("Writing user {}", user.id))?;
            }
            writer.flush().context("Flushing CSV output")?;
            Ok(())
        }
        ListFormat::Table => {
            let headers = USER_COLUMNS.map(String::from);
            let rows = users.iter().map(user_cells).collect::<Vec<_>>();
            table::print_table(&headers, &rows);
            Ok(())
        }
    }
}

const USER_COLUMNS: [&str; 5] = ["id", "name", "age", "address", "additional_info"];

fn user_cells(user: &StoredUser) -> Vec<String> {
    let document = |value: &Option<serde_json::Value>| {
        value.as_ref().map(|v| v.to_string()).unwrap_or_default()
    };
    vec![
        user.id.to_string(),
        user.name.clone(),
        user.age.to_string(),
        document(&user.address),
        document(&user.additional_info),
    ]
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, value).context("Writing JSON output")?;
    writeln!(handle)?;
    Ok(())
}
