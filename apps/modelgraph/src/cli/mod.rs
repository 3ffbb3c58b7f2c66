//! # Modelgraph CLI Module
//!
//! This module implements the CLI interface for Modelgraph.
//!
//! ## Available Commands
//!
//! - `validate` - Validate a document and report every issue
//! - `fmt` - Normalize a document (coerce defaults, stable field order)
//! - `export` - Re-export a document with the entity-name gate applied
//! - `layout` - Assign fresh deterministic grid positions
//! - `status` - Show document summary

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Modelgraph - document toolchain
///
/// Validates, normalizes and exports the JSON documents behind a
/// canvas model editor. All operations are deterministic: the same
/// input file always produces the same output, byte for byte.
#[derive(Parser, Debug)]
#[command(name = "modelgraph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a document and report every issue
    Validate {
        /// Path to the document file
        #[arg(short, long)]
        file: PathBuf,

        /// Apply the export gate too (every object must be named)
        #[arg(long)]
        strict: bool,
    },

    /// Normalize a document: fill defaults, drop unknown fields, stable order
    Fmt {
        /// Path to the document file
        #[arg(short, long)]
        file: PathBuf,

        /// Output file path (defaults to rewriting the input in place)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-export a document with the entity-name gate applied
    Export {
        /// Path to the document file
        #[arg(short, long)]
        file: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Discard stored positions and assign the deterministic grid layout
    Layout {
        /// Path to the document file
        #[arg(short, long)]
        file: PathBuf,

        /// Output file path (defaults to rewriting the input in place)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show document summary
    Status {
        /// Path to the document file
        #[arg(short, long)]
        file: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), AppError> {
    let quiet = cli.quiet;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Validate { file, strict } => cmd_validate(&file, strict, json_mode),
        Commands::Fmt { file, output } => cmd_fmt(&file, output.as_deref(), quiet),
        Commands::Export { file, output } => cmd_export(&file, &output, quiet),
        Commands::Layout { file, output } => cmd_layout(&file, output.as_deref(), quiet),
        Commands::Status { file } => cmd_status(&file, json_mode),
    }
}
