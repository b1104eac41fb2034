//! # Journal CLI Module
//!
//! This module implements the CLI interface for the Data Journal.
//!
//! ## Available Commands
//!
//! - `init` - Create an empty journal file
//! - `status` - Show the journal overview
//! - `defs` - List live definitions
//! - `commit` - Apply a transaction file
//! - `query` - Filter entries, optionally rolled up
//! - `export` - Write the journal in another encoding
//! - `import` - Replace the journal with an exported file

mod commands;

use crate::config::JournalConfig;
use clap::{Args, Parser, Subcommand};
use journal_core::{Format, IncludeDeleted, JournalError, Scope, Timestamp};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Data Journal
///
/// Record metric definitions and time-stamped entries, merge writes from
/// many sources and query the result.
#[derive(Parser, Debug)]
#[command(name = "journal")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the journal file (overrides config and JOURNAL_DB)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Encoding of the journal file: json or canonical
    #[arg(short = 'F', long, global = true, value_parser = parse_format)]
    pub format: Option<Format>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Flags take precedence over file and environment.
    pub fn apply_overrides(&self, config: &mut JournalConfig) {
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(format) = self.format {
            config.format = Some(format);
        }
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty journal
    Init {
        /// Force initialization even if the journal exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show record counts per kind
    Status,

    /// List live definitions
    Defs,

    /// Apply a transaction file
    Commit {
        /// Path to the transaction (JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Skip boundary validation
        #[arg(long)]
        no_validate: bool,

        /// JSON object mapping local field names to canonical ones
        #[arg(short, long)]
        aliases: Option<PathBuf>,
    },

    /// Query entries
    Query(QueryArgs),

    /// Export the journal
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (json, canonical); inferred from the extension when absent
        #[arg(short = 't', long, value_parser = parse_format)]
        format: Option<Format>,
    },

    /// Replace the journal with an exported file
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

/// Query flags. Id lists accept repeated flags or comma-separated values.
#[derive(Args, Debug, Default)]
pub struct QueryArgs {
    /// Definition ids
    #[arg(long, value_delimiter = ',')]
    pub did: Vec<String>,

    /// Definition labels
    #[arg(long, value_delimiter = ',')]
    pub def_lbl: Vec<String>,

    /// Record version uids
    #[arg(long, value_delimiter = ',')]
    pub uid: Vec<String>,

    /// Entry ids
    #[arg(long, value_delimiter = ',')]
    pub eid: Vec<String>,

    /// Tag ids; selects definitions carrying any of them
    #[arg(long, value_delimiter = ',')]
    pub tag: Vec<String>,

    /// Exclusive lower bound on `_created` (epoch ms or RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub created_after: Option<Timestamp>,

    #[arg(long, value_parser = parse_timestamp)]
    pub created_before: Option<Timestamp>,

    #[arg(long, value_parser = parse_timestamp)]
    pub updated_after: Option<Timestamp>,

    #[arg(long, value_parser = parse_timestamp)]
    pub updated_before: Option<Timestamp>,

    /// Inclusive lower period bound
    #[arg(long)]
    pub from: Option<String>,

    /// Inclusive upper period bound
    #[arg(long)]
    pub to: Option<String>,

    /// Definition scopes
    #[arg(long, value_delimiter = ',')]
    pub scope: Vec<Scope>,

    /// This scope and coarser
    #[arg(long)]
    pub scope_min: Option<Scope>,

    /// This scope and finer
    #[arg(long)]
    pub scope_max: Option<Scope>,

    /// Aggregate the result at this scope
    #[arg(long)]
    pub rollup: Option<Scope>,

    /// Sort by period, created, updated, eid, did or uid
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Allow a query without any filter
    #[arg(long)]
    pub all: bool,

    /// no, yes or only
    #[arg(long, default_value = "no")]
    pub include_deleted: IncludeDeleted,
}

fn parse_format(s: &str) -> Result<Format, JournalError> {
    Format::parse(s)
}

fn parse_timestamp(s: &str) -> Result<Timestamp, JournalError> {
    Timestamp::parse(s)
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and resolved configuration.
pub async fn execute(cli: Cli, config: JournalConfig) -> Result<(), JournalError> {
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&config, force),
        Some(Commands::Status) => cmd_status(&config, json_mode).await,
        Some(Commands::Defs) => cmd_defs(&config, json_mode).await,
        Some(Commands::Commit {
            file,
            no_validate,
            aliases,
        }) => cmd_commit(&config, json_mode, &file, !no_validate, aliases.as_deref()).await,
        Some(Commands::Query(args)) => cmd_query(&config, json_mode, args).await,
        Some(Commands::Export { output, format }) => cmd_export(&config, &output, format),
        Some(Commands::Import { input }) => cmd_import(&config, &input),
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode).await
        }
    }
}
