//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::QueryArgs;
use crate::config::JournalConfig;
use crate::shared::SharedJournal;
use journal_core::{
    AliasMap, CommitResult, Format, Journal, JournalError, Overview, QueryOutput, Transaction,
    primitives::MAX_PERSISTENCE_PAYLOAD_SIZE,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a transaction or alias file (100 MB).
const MAX_TRANSACTION_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), JournalError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| JournalError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(JournalError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and make sure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, JournalError> {
    let canonical = path.canonicalize().map_err(|e| {
        JournalError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(JournalError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path against its existing parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, JournalError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        JournalError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(JournalError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| JournalError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

/// Read a bounded input file.
fn read_input(path: &Path, max_size: u64) -> Result<Vec<u8>, JournalError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read(&validated)
        .map_err(|e| JournalError::IoError(format!("Read '{}': {}", path.display(), e)))
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write an empty journal.
pub fn cmd_init(config: &JournalConfig, force: bool) -> Result<(), JournalError> {
    if config.database.exists() && !force {
        return Err(JournalError::Validation(
            "Journal already exists. Use --force to overwrite.".to_string(),
        ));
    }

    save_journal(&Journal::new(), config)?;
    println!(
        "Initialized new {} journal at {:?}",
        config.resolved_format(),
        config.database
    );
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show record counts per kind.
pub async fn cmd_status(config: &JournalConfig, json_mode: bool) -> Result<(), JournalError> {
    let shared = SharedJournal::from_journal(load_journal(config)?, true);
    let overview = shared.get_overview().await?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": config.database.to_string_lossy(),
            "format": config.resolved_format().to_string(),
            "overview": overview,
        }));
        return Ok(());
    }

    print_overview(config, &overview);
    Ok(())
}

fn print_overview(config: &JournalConfig, overview: &Overview) {
    println!("Journal Status");
    println!("==============");
    println!("Database: {:?}", config.database);
    println!("Format:   {}", config.resolved_format());
    println!();
    println!("{:<18} {:>8} {:>8} {:>9}", "Kind", "Current", "Deleted", "Versions");
    for (name, kind) in [
        ("tagDefinitions", overview.tag_definitions),
        ("definitions", overview.definitions),
        ("pointDefinitions", overview.point_definitions),
        ("tags", overview.tags),
        ("entries", overview.entries),
        ("entryPoints", overview.entry_points),
    ] {
        println!(
            "{:<18} {:>8} {:>8} {:>9}",
            name, kind.current, kind.deleted, kind.versions
        );
    }
    println!();
    match overview.last_updated {
        Some(at) => println!("Last updated: {}", at),
        None => println!("Last updated: never"),
    }
}

// =============================================================================
// DEFS COMMAND
// =============================================================================

/// List live definitions.
pub async fn cmd_defs(config: &JournalConfig, json_mode: bool) -> Result<(), JournalError> {
    let shared = SharedJournal::from_journal(load_journal(config)?, true);
    let defs = shared.get_defs().await?;

    if json_mode {
        print_json(&defs);
        return Ok(());
    }

    if defs.is_empty() {
        println!("No definitions.");
        return Ok(());
    }

    for def in &defs {
        let points: Vec<&str> = def.points.live().map(|p| p.pid.as_str()).collect();
        println!(
            "{:<20} {:<24} {:<8} [{}]",
            def.did,
            def.label,
            def.scope,
            points.join(", ")
        );
    }
    Ok(())
}

// =============================================================================
// COMMIT COMMAND
// =============================================================================

/// Apply a transaction file and persist the result.
pub async fn cmd_commit(
    config: &JournalConfig,
    json_mode: bool,
    file: &Path,
    validate: bool,
    aliases: Option<&Path>,
) -> Result<(), JournalError> {
    let tx = read_transaction(file, aliases)?;
    let shared = SharedJournal::from_journal(load_journal(config)?, validate);

    let result = shared.commit(&tx).await?;
    save_journal(&shared.snapshot().await, config)?;

    if json_mode {
        print_json(&result);
        return Ok(());
    }

    print_commit(&result);
    Ok(())
}

/// Parse a transaction file, renaming aliased keys first when a map is given.
pub fn read_transaction(file: &Path, aliases: Option<&Path>) -> Result<Transaction, JournalError> {
    let data = read_input(file, MAX_TRANSACTION_FILE_SIZE)?;
    let mut doc: serde_json::Value = serde_json::from_slice(&data)
        .map_err(|e| JournalError::DeserializationError(format!("Transaction: {}", e)))?;

    if let Some(path) = aliases {
        let data = read_input(path, MAX_TRANSACTION_FILE_SIZE)?;
        let map: AliasMap = serde_json::from_slice(&data)
            .map_err(|e| JournalError::DeserializationError(format!("Alias map: {}", e)))?;
        doc = map.to_canonical(&doc);
    }

    serde_json::from_value(doc)
        .map_err(|e| JournalError::DeserializationError(format!("Transaction: {}", e)))
}

fn print_commit(result: &CommitResult) {
    println!(
        "Committed: {} applied, {} skipped",
        result.stats.applied,
        result.stats.skipped()
    );
    for (name, kind) in result.diff.kinds() {
        if kind.total() > 0 {
            println!(
                "  {:<18} +{} ~{} -{}",
                name, kind.created, kind.modified, kind.deleted
            );
        }
    }
    if result.stats.stale > 0 {
        println!("  {} stale write(s) discarded", result.stats.stale);
    }
    if result.stats.orphaned > 0 {
        println!("  {} instruction(s) without a parent", result.stats.orphaned);
    }
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// Filter entries, optionally sorted and rolled up.
pub async fn cmd_query(
    config: &JournalConfig,
    json_mode: bool,
    args: QueryArgs,
) -> Result<(), JournalError> {
    let shared = SharedJournal::from_journal(load_journal(config)?, true);
    let output = shared.run_query(move |query| apply_args(query, args)).await?;

    if json_mode {
        print_json(&output);
        return Ok(());
    }

    print_query(&output);
    Ok(())
}

/// Translate flags to builder calls. Tags are applied after `--did` and
/// scopes after tags; each of them rewrites the definition filter.
fn apply_args<'c, C: journal_core::Connector + ?Sized>(
    mut query: journal_core::QueryBuilder<'c, C>,
    args: QueryArgs,
) -> journal_core::QueryBuilder<'c, C> {
    query = query.include_deleted(args.include_deleted);

    if !args.did.is_empty() {
        query = query.did(args.did);
    }
    if !args.tag.is_empty() {
        query = query.tags(args.tag);
    }
    if !args.scope.is_empty() {
        query = query.scope(args.scope);
    }
    if let Some(scope) = args.scope_min {
        query = query.scope_min(scope);
    }
    if let Some(scope) = args.scope_max {
        query = query.scope_max(scope);
    }
    if !args.def_lbl.is_empty() {
        query = query.def_lbl(args.def_lbl);
    }
    if !args.uid.is_empty() {
        query = query.uid(args.uid);
    }
    if !args.eid.is_empty() {
        query = query.eid(args.eid);
    }
    if let Some(at) = args.created_after {
        query = query.created_after(at);
    }
    if let Some(at) = args.created_before {
        query = query.created_before(at);
    }
    if let Some(at) = args.updated_after {
        query = query.updated_after(at);
    }
    if let Some(at) = args.updated_before {
        query = query.updated_before(at);
    }
    if let Some(period) = args.from {
        query = query.from(period);
    }
    if let Some(period) = args.to {
        query = query.to(period);
    }
    if let Some(scope) = args.rollup {
        query = query.rollup(scope);
    }
    if let Some(field) = args.sort {
        query = if args.desc {
            query.sort_by_desc(&field)
        } else {
            query.sort_by(&field)
        };
    }
    if args.all {
        query = query.all_on_purpose();
    }
    query
}

fn print_query(output: &QueryOutput) {
    println!("{} entries", output.entries.len());
    for entry in &output.entries {
        let marker = if entry.deleted { " (deleted)" } else { "" };
        println!(
            "  {:<20} {:<16} {:<20} {} point(s){}",
            entry.eid,
            entry.did,
            entry.period.as_str(),
            entry.points.live().count(),
            marker
        );
    }

    if let Some(rollup) = &output.rollup {
        println!();
        println!("Rollup");
        for (period, defs) in &rollup.buckets {
            for (did, points) in defs {
                for (pid, aggregate) in points {
                    let value = aggregate
                        .value
                        .as_ref()
                        .and_then(|v| serde_json::to_string(v).ok())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {:<12} {:<16} {:<16} {:?} n={} {}",
                        period.as_str(),
                        did,
                        pid,
                        aggregate.strategy,
                        aggregate.samples,
                        value
                    );
                }
            }
        }
    }
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Write the journal to `output` in the requested encoding.
pub fn cmd_export(
    config: &JournalConfig,
    output: &Path,
    format: Option<Format>,
) -> Result<(), JournalError> {
    let validated = validate_output_path(output)?;
    let format = format
        .or_else(|| Format::from_path(output).ok())
        .unwrap_or_default();

    let journal = load_journal(config)?;
    let data = format.export(&journal)?;
    std::fs::write(&validated, &data)
        .map_err(|e| JournalError::IoError(format!("Write file: {}", e)))?;

    tracing::info!(path = %validated.display(), %format, bytes = data.len(), "exported");
    println!("Exported journal to {:?} ({}, {} bytes)", output, format, data.len());
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// Replace the journal with the contents of an exported file.
pub fn cmd_import(config: &JournalConfig, input: &Path) -> Result<(), JournalError> {
    let data = read_input(input, MAX_PERSISTENCE_PAYLOAD_SIZE as u64)?;
    let journal = Format::sniff(&data).import(&data)?;
    save_journal(&journal, config)?;

    let overview = Overview::of(&journal);
    println!(
        "Imported journal: {} definitions, {} entries",
        overview.definitions.current, overview.entries.current
    );
    Ok(())
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Load the journal file, or an empty journal if it does not exist yet.
///
/// The encoding is detected from the content, so a JSON journal stays
/// readable after the configured format changes.
pub fn load_journal(config: &JournalConfig) -> Result<Journal, JournalError> {
    let path = &config.database;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no journal file, starting empty");
        return Ok(Journal::new());
    }

    let data = read_input(path, MAX_PERSISTENCE_PAYLOAD_SIZE as u64)?;
    let format = Format::sniff(&data);
    let journal = format.import(&data)?;
    tracing::debug!(path = %path.display(), %format, bytes = data.len(), "journal loaded");
    Ok(journal)
}

/// Write the journal file in the configured encoding.
pub fn save_journal(journal: &Journal, config: &JournalConfig) -> Result<(), JournalError> {
    let format = config.resolved_format();
    let data = format.export(journal)?;
    std::fs::write(&config.database, &data)
        .map_err(|e| JournalError::IoError(format!("Write journal: {}", e)))?;
    tracing::debug!(path = %config.database.display(), %format, bytes = data.len(), "journal saved");
    Ok(())
}
