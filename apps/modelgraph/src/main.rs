//! # Modelgraph - Document Toolchain
//!
//! The main binary for the Modelgraph model-integrity engine.
//!
//! This application provides:
//! - Document validation with full issue reports
//! - Normalization (coerce + re-serialize) of hand-edited files
//! - Export with the entity-name gate applied
//! - Deterministic grid layout assignment
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │            apps/modelgraph (THE BINARY)        │
//! │                                                │
//! │  ┌─────────────┐          ┌────────────────┐  │
//! │  │   CLI       │          │   File I/O     │  │
//! │  │  (clap)     │          │  (documents)   │  │
//! │  └──────┬──────┘          └───────┬────────┘  │
//! │         │                         │           │
//! │         └────────────┬────────────┘           │
//! │                      ▼                        │
//! │            ┌──────────────────┐               │
//! │            │ modelgraph-core  │               │
//! │            │   (THE LOGIC)    │               │
//! │            └──────────────────┘               │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Validate a document and list every issue
//! modelgraph validate -f model.json
//!
//! # Normalize a hand-edited file in place
//! modelgraph fmt -f model.json
//!
//! # Re-export with the entity-name gate and grid layout
//! modelgraph export -f model.json -o out.json
//! modelgraph layout -f model.json
//! modelgraph status -f model.json
//! ```

mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    // Initialize tracing — MODELGRAPH_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("MODELGRAPH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "modelgraph=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Execute command
    if let Err(e) = cli::execute(cli) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
