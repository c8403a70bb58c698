//! # Lexflow - Legal-Deadline Workflow Server
//!
//! The main binary for the Lexflow deadline and case-stage engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                apps/lexflow (THE BINARY)                 │
//! │                                                          │
//! │  ┌─────────────┐   ┌─────────────┐   ┌──────────────┐    │
//! │  │    CLI      │   │  HTTP API   │   │  Config +    │    │
//! │  │   (clap)    │   │   (axum)    │   │  redb store  │    │
//! │  └──────┬──────┘   └──────┬──────┘   └──────┬───────┘    │
//! │         └─────────────────┼─────────────────┘            │
//! │                           ▼                              │
//! │                  ┌────────────────┐                      │
//! │                  │  lexflow-core  │                      │
//! │                  │  (THE LOGIC)   │                      │
//! │                  └────────────────┘                      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! lexflow init
//! lexflow open --case 2025-0001 --actor clerk
//! lexflow transition --case 2025-0001 --to intake --actor clerk
//! lexflow report --now 2025-03-10T09:00:00Z
//! lexflow serve --port 8080
//! ```

use clap::Parser;
use lexflow::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // LEXFLOW_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("LEXFLOW_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lexflow=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Lexflow startup banner.
fn print_banner() {
    println!(
        r#"
  ╦  ╔═╗═╗ ╦╔═╗╦  ╔═╗╦ ╦
  ║  ║╣ ╔╩╦╝╠╣ ║  ║ ║║║║
  ╩═╝╚═╝╩ ╚═╚  ╩═╝╚═╝╚╩╝

  Legal-Deadline Workflow Engine v{}

  Business days • Statutory stages • Deterministic
"#,
        env!("CARGO_PKG_VERSION")
    );
}
