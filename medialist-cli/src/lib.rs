//! Library entry for medialist-cli used by integration tests and embedding.

pub mod commands;

// Re-export commands for convenience
pub use commands::*;

/// How `inspect` renders recovered items
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum InspectFormat {
    /// One line per item
    Text,
    /// The full load report as pretty JSON
    Json,
}
