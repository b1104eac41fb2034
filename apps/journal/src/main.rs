//! # Data Journal
//!
//! The command-line binary over the `journal-core` engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                apps/journal (THE BINARY)             │
//! │                                                      │
//! │  ┌─────────────┐   ┌──────────────┐   ┌──────────┐   │
//! │  │    CLI      │──▶│ SharedJournal│   │  Config  │   │
//! │  │   (clap)    │   │   (tokio)    │   │  (toml)  │   │
//! │  └─────────────┘   └──────┬───────┘   └──────────┘   │
//! │                           ▼                          │
//! │                   ┌───────────────┐                  │
//! │                   │ journal-core  │                  │
//! │                   │ (THE ENGINE)  │                  │
//! │                   └───────────────┘                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! journal init
//! journal commit -f tx.json
//! journal query --did mood --from 2024-01-01 --rollup month
//! journal export -o backup.jrnl -t canonical
//! ```

use clap::Parser;
use journal::cli::{self, Cli};
use journal::config::{JournalConfig, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Tracing is not up yet, so config errors go straight to stderr.
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&config);

    if let Err(e) = cli::execute(cli, config).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// File, then environment, then flags.
fn load_config(cli: &Cli) -> Result<JournalConfig, journal_core::JournalError> {
    let mut config = JournalConfig::load(cli.config.as_deref())?;
    config.apply_env();
    cli.apply_overrides(&mut config);
    Ok(config)
}

fn init_tracing(config: &JournalConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter.as_str().into());

    match config.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
