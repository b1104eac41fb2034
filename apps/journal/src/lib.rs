//! # journal
//!
//! Application layer over `journal-core`: configuration, the shared async
//! store and the command-line interface.

pub mod cli;
pub mod config;
pub mod shared;

pub use config::{JournalConfig, LogFormat};
pub use shared::SharedJournal;
