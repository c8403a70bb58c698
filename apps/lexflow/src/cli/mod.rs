//! # Lexflow CLI Module
//!
//! This module implements the CLI interface for Lexflow.
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server
//! - `init` - Initialize a new case database
//! - `open` - File a new case
//! - `transition` - Move a case to another stage
//! - `complete` / `extend` / `progress` / `notify` / `note` - Deadline operations
//! - `show` - Show a case as of now
//! - `recompute` - Recompute and persist deadline statuses
//! - `report` - Portfolio summary
//! - `stages` - List stages and permitted transitions
//! - `business-days add|count` - Calendar arithmetic

mod commands;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use lexflow_core::LexflowError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Lexflow - legal-deadline and case-stage workflow engine
///
/// Tracks statutory deadlines of workplace harassment investigations on a
/// business-day calendar.
#[derive(Parser, Debug)]
#[command(name = "lexflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(short = 'c', long, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Path to the case database
    #[arg(short = 'D', long, global = true, default_value = "lexflow.db")]
    pub database: PathBuf,

    /// Evaluate as of this instant (RFC 3339) instead of the system clock
    #[arg(long, global = true, value_parser = parse_instant)]
    pub now: Option<DateTime<Utc>>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The instant commands evaluate against.
    #[must_use]
    pub fn clock(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Initialize a new empty case database
    Init {
        /// Replace an existing database
        #[arg(short, long)]
        force: bool,
    },

    /// File a new case
    Open {
        /// Case id
        #[arg(long)]
        case: String,

        /// Who filed the case
        #[arg(long)]
        actor: String,
    },

    /// Move a case to another stage
    Transition {
        #[arg(long)]
        case: String,

        /// Target stage (e.g. "investigation")
        #[arg(long)]
        to: String,

        #[arg(long)]
        actor: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark a deadline as completed
    Complete {
        #[arg(long)]
        case: String,

        /// Deadline number within the case
        #[arg(long)]
        deadline: u64,

        #[arg(long)]
        by: String,
    },

    /// Extend a deadline
    Extend {
        #[arg(long)]
        case: String,

        #[arg(long)]
        deadline: u64,

        /// Additional days, counted under the deadline's own policy
        #[arg(long, allow_negative_numbers = true)]
        days: i64,

        #[arg(long)]
        reason: String,

        #[arg(long)]
        approved_by: String,
    },

    /// Set deadline progress (clamped to 0-100)
    Progress {
        #[arg(long)]
        case: String,

        #[arg(long)]
        deadline: u64,

        #[arg(long, allow_negative_numbers = true)]
        percent: i64,
    },

    /// Record a notification sent about a deadline
    Notify {
        #[arg(long)]
        case: String,

        #[arg(long)]
        deadline: u64,

        #[arg(long)]
        recipient: String,

        /// email, sms or system
        #[arg(long, default_value = "email")]
        channel: String,
    },

    /// Replace the notes of a deadline
    Note {
        #[arg(long)]
        case: String,

        #[arg(long)]
        deadline: u64,

        #[arg(long)]
        text: String,
    },

    /// Show a case with statuses as of now (not persisted)
    Show {
        #[arg(long)]
        case: String,
    },

    /// Recompute and persist deadline statuses
    Recompute {
        /// Only this case (default: every case)
        #[arg(long)]
        case: Option<String>,
    },

    /// Portfolio summary as of now
    Report,

    /// List stages and permitted transitions
    Stages,

    /// Business-day calendar arithmetic
    #[command(subcommand)]
    BusinessDays(BusinessDaysCommand),
}

/// Calendar subcommands.
#[derive(Subcommand, Debug)]
pub enum BusinessDaysCommand {
    /// Advance a date by business days
    Add {
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,

        #[arg(long)]
        days: i64,
    },

    /// Count business days between two dates (inclusive)
    Count {
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,

        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), LexflowError> {
    let now = cli.clock();
    let ctx = Context {
        database: cli.database,
        config: cli.config,
        json_mode: cli.json_mode,
        now,
    };

    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(&ctx, &host, port).await,
        Some(Commands::Init { force }) => cmd_init(&ctx, force),
        Some(Commands::Open { case, actor }) => cmd_open(&ctx, &case, &actor),
        Some(Commands::Transition {
            case,
            to,
            actor,
            notes,
        }) => cmd_transition(&ctx, &case, &to, &actor, notes.as_deref()),
        Some(Commands::Complete { case, deadline, by }) => {
            cmd_complete(&ctx, &case, deadline, &by)
        }
        Some(Commands::Extend {
            case,
            deadline,
            days,
            reason,
            approved_by,
        }) => cmd_extend(&ctx, &case, deadline, days, &reason, &approved_by),
        Some(Commands::Progress {
            case,
            deadline,
            percent,
        }) => cmd_progress(&ctx, &case, deadline, percent),
        Some(Commands::Notify {
            case,
            deadline,
            recipient,
            channel,
        }) => cmd_notify(&ctx, &case, deadline, &recipient, &channel),
        Some(Commands::Note {
            case,
            deadline,
            text,
        }) => cmd_note(&ctx, &case, deadline, &text),
        Some(Commands::Show { case }) => cmd_show(&ctx, &case),
        Some(Commands::Recompute { case }) => cmd_recompute(&ctx, case.as_deref()),
        Some(Commands::Stages) => cmd_stages(&ctx),
        Some(Commands::BusinessDays(BusinessDaysCommand::Add { from, days })) => {
            cmd_business_days_add(&ctx, from, days)
        }
        Some(Commands::BusinessDays(BusinessDaysCommand::Count { from, to })) => {
            cmd_business_days_count(&ctx, from, to)
        }
        // No subcommand - portfolio report by default
        Some(Commands::Report) | None => cmd_report(&ctx),
    }
}
