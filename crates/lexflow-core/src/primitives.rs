//! # Engine Primitives
//!
//! Compiled-in constants of the Lexflow engine.
//!
//! Policy values here are only defaults: the classification thresholds are
//! carried by [`crate::StatusThresholds`] and can be replaced per deployment.

/// Default `days_remaining` at or below which a deadline is `critical`.
pub const DEFAULT_CRITICAL_DAYS: i64 = 1;

/// Default `days_remaining` at or below which a deadline is `warning`.
pub const DEFAULT_WARNING_DAYS: i64 = 3;

/// Upper bound of `progress_percentage`.
pub const MAX_PROGRESS: u8 = 100;

/// Denominator for portfolio rates (basis points).
pub const RATE_SCALE: u64 = 10_000;

/// Magic bytes for the Lexflow snapshot format header.
pub const MAGIC_BYTES: &[u8; 4] = b"LXFW";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Largest day count accepted for templates and extensions (about ten years
/// of calendar days). Larger values are rejected as out of range.
pub const MAX_DAY_COUNT: i64 = 3_660;

/// Maximum length for free-text notes on deadlines and transitions.
pub const MAX_NOTES_LENGTH: usize = 16_384;
