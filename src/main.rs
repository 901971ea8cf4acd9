//! addb2db CLI
//!
//! Loads ADDB trace dumps into a SQLite database for offline analysis.

use addb2db::commands::{
    display_schema, display_version, execute_check, execute_ingest, print_check_summary,
    validate_args, CancelFlag, CheckArgs, IngestArgs,
};
use addb2db::output::summary_to_string;
use addb2db::store::JournalMode;
use addb2db::utils::config::{
    load_config, RunConfig, DB_ENV_VAR, DEFAULT_BATCH_ROWS, DEFAULT_BLOCK_LINES, DEFAULT_DB_PATH,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;
use signal_hook::consts::{SIGINT, SIGTERM};
use std::path::PathBuf;

/// addb2db - load ADDB trace dumps into SQLite
#[derive(Parser, Debug)]
#[command(name = "addb2db")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest dump files into the destination database
    Ingest {
        /// Dump files, ingested in order; none means nothing to do
        #[arg(long, num_args = 1..)]
        dumps: Vec<PathBuf>,

        /// Destination database
        #[arg(long, env = DB_ENV_VAR)]
        db: Option<PathBuf>,

        /// Lines read per block
        #[arg(long)]
        block: Option<usize>,

        /// Maximum rows per INSERT
        #[arg(long)]
        batch: Option<usize>,

        /// Keep existing rows instead of recreating the tables
        #[arg(long)]
        append_db: bool,

        /// Build lookup indexes after ingestion
        #[arg(long)]
        create_indexes: bool,

        /// SQLite journal mode
        #[arg(long, value_enum)]
        journal_mode: Option<JournalMode>,

        /// TOML run configuration
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a JSON run summary here
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// Parse dump files without writing and report counts
    Check {
        /// Dump files to scan
        #[arg(long, required = true, num_args = 1..)]
        dumps: Vec<PathBuf>,

        /// Lines read per block
        #[arg(long, default_value_t = DEFAULT_BLOCK_LINES)]
        block: usize,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display the destination schema
    Schema {
        /// List registered record types
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Ingest {
            dumps,
            db,
            block,
            batch,
            append_db,
            create_indexes,
            journal_mode,
            config,
            summary_json,
        } => {
            let file_config = match &config {
                Some(path) => load_config(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => RunConfig::default(),
            };

            let cancel = CancelFlag::new();
            for signal in [SIGINT, SIGTERM] {
                signal_hook::flag::register(signal, cancel.as_arc())
                    .context("Failed to install signal handler")?;
            }

            let overrides = CliOverrides {
                db: db.as_ref().is_some_and(|p| !p.as_os_str().is_empty()),
                block: block.is_some(),
                batch: batch.is_some(),
                journal_mode: journal_mode.is_some(),
            };
            let args = merge_ingest_args(
                IngestArgs {
                    dumps,
                    db: db.unwrap_or_default(),
                    block_lines: block.unwrap_or(0),
                    batch_rows: batch.unwrap_or(0),
                    append_db,
                    create_indexes,
                    journal_mode: journal_mode.unwrap_or_default(),
                    summary_json,
                    cancel,
                },
                overrides,
                &file_config,
            );
            debug!("Ingest arguments: {:?}", args);

            // Validate args first
            validate_args(&args)?;

            execute_ingest(args)?;
        }

        Commands::Check { dumps, block, json } => {
            let args = CheckArgs {
                dumps,
                block_lines: block,
                json,
            };
            let summary = execute_check(&args)?;
            if args.json {
                println!("{}", summary_to_string(&summary)?);
            } else {
                print_check_summary(&summary);
            }
        }

        Commands::Schema { show } => {
            display_schema(show)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Which ingest values came from the command line (or its env fallback)
#[derive(Debug, Clone, Copy, Default)]
struct CliOverrides {
    db: bool,
    block: bool,
    batch: bool,
    journal_mode: bool,
}

/// Layer command-line values over the config file over built-in defaults
///
/// **Private** - boolean flags are additive: a flag on the command line or
/// `true` in the file turns the behavior on.
fn merge_ingest_args(mut args: IngestArgs, cli: CliOverrides, file: &RunConfig) -> IngestArgs {
    if !cli.db {
        args.db = file
            .db
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
    }
    if !cli.block {
        args.block_lines = file.block.unwrap_or(DEFAULT_BLOCK_LINES);
    }
    if !cli.batch {
        args.batch_rows = file.batch.unwrap_or(DEFAULT_BATCH_ROWS);
    }
    if !cli.journal_mode {
        args.journal_mode = file.journal_mode.unwrap_or_default();
    }
    args.append_db |= file.append_db.unwrap_or(false);
    args.create_indexes |= file.create_indexes.unwrap_or(false);
    args
}
