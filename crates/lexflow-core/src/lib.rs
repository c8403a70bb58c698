//! # lexflow-core
//!
//! The deterministic deadline and case-stage engine for Lexflow - THE LOGIC.
//!
//! This crate tracks statutory deadlines of workplace harassment
//! investigations: it computes due dates on a business-day calendar,
//! classifies deadlines as time passes, and moves cases through the
//! procedure's stages along an explicit adjacency table.
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Never reads the clock: `now` is always a parameter
//! - Never reads global holiday tables: a [`HolidaySet`] is always a parameter
//! - Never mutates its input: every operation returns a new value
//! - Never logs: errors are values for the caller to report
//! - Has NO async, NO network, NO filesystem dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod calendar;
pub mod deadline;
pub mod formats;
pub mod primitives;
pub mod report;
pub mod system;
pub mod template;
pub mod types;
pub mod workflow;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CaseId, DayCountPolicy, DeadlineId, DeadlineKind, DeadlineStatus, LexflowError,
    NotificationChannel, Priority, TransitionViolation,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use calendar::{
    HolidaySet, add_business_days, add_calendar_days, count_business_days, is_business_day,
};
pub use deadline::{
    CompletionRecord, Deadline, DeadlineEngine, ExtensionRecord, NotificationEntry,
    StatusThresholds,
};
pub use report::{NextCriticalDeadline, PortfolioSummary, summarize};
pub use template::{DeadlineTemplate, TemplateCatalog, TemplateSpec};
pub use workflow::{CaseWorkflow, CaseWorkflowState, StageTransitionRecord};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{SnapshotHeader, case_from_bytes, case_to_bytes, snapshot_checksum};

#[cfg(feature = "crypto-hash")]
pub use formats::snapshot_crypto_hash;

// =============================================================================
// RE-EXPORTS: System (from system module)
// =============================================================================

pub use system::{Stage, TransitionTable};
