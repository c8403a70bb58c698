//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the Lexflow engine:
//! - Identifiers (`CaseId`, `DeadlineId`)
//! - Closed enumerations (`DeadlineKind`, `DeadlineStatus`, `DayCountPolicy`,
//!   `Priority`, `NotificationChannel`)
//! - Error types (`LexflowError`, `TransitionViolation`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` where they are used as map keys or tie-breakers
//! - Serialize to stable `snake_case` names

use crate::system::Stage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a case, as assigned by the caller's case store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CaseId(pub String);

impl CaseId {
    /// Create a new case id.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a deadline, unique within its case.
///
/// Ids are assigned sequentially by the workflow, so two replays of the same
/// transition history produce the same ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct DeadlineId(pub u64);

impl DeadlineId {
    /// The id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl std::fmt::Display for DeadlineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "D-{}", self.0)
    }
}

// =============================================================================
// DEADLINE CLASSIFICATION
// =============================================================================

/// How a template's day count is turned into a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCountPolicy {
    /// Weekends and holidays are skipped.
    Business,
    /// Every calendar day counts.
    Calendar,
}

impl DayCountPolicy {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DayCountPolicy::Business => "business",
            DayCountPolicy::Calendar => "calendar",
        }
    }
}

/// Live status of a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    OnTrack,
    Warning,
    Critical,
    Expired,
    Completed,
    Extended,
}

impl DeadlineStatus {
    /// Completed and expired deadlines are not reclassified by recomputation.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeadlineStatus::Completed | DeadlineStatus::Expired)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlineStatus::OnTrack => "on_track",
            DeadlineStatus::Warning => "warning",
            DeadlineStatus::Critical => "critical",
            DeadlineStatus::Expired => "expired",
            DeadlineStatus::Completed => "completed",
            DeadlineStatus::Extended => "extended",
        }
    }
}

impl std::fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deadline priority. Declaration order is the sort order (`Low < High`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Channel through which an external notifier delivered a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
    System,
}

impl std::str::FromStr for NotificationChannel {
    type Err = LexflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(NotificationChannel::Email),
            "sms" => Ok(NotificationChannel::Sms),
            "system" => Ok(NotificationChannel::System),
            other => Err(LexflowError::OutOfRangeInput(format!(
                "Unknown notification channel: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// DEADLINE KINDS
// =============================================================================

/// The closed set of deadline kinds the procedure knows about.
///
/// Each kind is bound to exactly one stage by the template catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineKind {
    RegulatorIntakeNotice,
    AdmissibilityReview,
    PrecautionaryMeasuresAdoption,
    ThirdPartyEmployerNotice,
    PrincipalCompanyNotice,
    InvestigationCompletion,
    InterviewsCompletion,
    ReportIssuance,
    ReportSubmission,
    RegulatorPronouncement,
    RemedialMeasuresAdoption,
    SanctionsApplication,
    FalseClaimDetermination,
    RetaliationAssessment,
    FollowUpReview,
    ExternalReferral,
}

impl DeadlineKind {
    /// Every kind, in declaration order.
    pub const ALL: [DeadlineKind; 16] = [
        DeadlineKind::RegulatorIntakeNotice,
        DeadlineKind::AdmissibilityReview,
        DeadlineKind::PrecautionaryMeasuresAdoption,
        DeadlineKind::ThirdPartyEmployerNotice,
        DeadlineKind::PrincipalCompanyNotice,
        DeadlineKind::InvestigationCompletion,
        DeadlineKind::InterviewsCompletion,
        DeadlineKind::ReportIssuance,
        DeadlineKind::ReportSubmission,
        DeadlineKind::RegulatorPronouncement,
        DeadlineKind::RemedialMeasuresAdoption,
        DeadlineKind::SanctionsApplication,
        DeadlineKind::FalseClaimDetermination,
        DeadlineKind::RetaliationAssessment,
        DeadlineKind::FollowUpReview,
        DeadlineKind::ExternalReferral,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlineKind::RegulatorIntakeNotice => "regulator_intake_notice",
            DeadlineKind::AdmissibilityReview => "admissibility_review",
            DeadlineKind::PrecautionaryMeasuresAdoption => "precautionary_measures_adoption",
            DeadlineKind::ThirdPartyEmployerNotice => "third_party_employer_notice",
            DeadlineKind::PrincipalCompanyNotice => "principal_company_notice",
            DeadlineKind::InvestigationCompletion => "investigation_completion",
            DeadlineKind::InterviewsCompletion => "interviews_completion",
            DeadlineKind::ReportIssuance => "report_issuance",
            DeadlineKind::ReportSubmission => "report_submission",
            DeadlineKind::RegulatorPronouncement => "regulator_pronouncement",
            DeadlineKind::RemedialMeasuresAdoption => "remedial_measures_adoption",
            DeadlineKind::SanctionsApplication => "sanctions_application",
            DeadlineKind::FalseClaimDetermination => "false_claim_determination",
            DeadlineKind::RetaliationAssessment => "retaliation_assessment",
            DeadlineKind::FollowUpReview => "follow_up_review",
            DeadlineKind::ExternalReferral => "external_referral",
        }
    }
}

impl std::fmt::Display for DeadlineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// What made a transition illegal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionViolation {
    /// The target stage is not a permitted successor of the current stage.
    Stage { from: Stage, to: Stage },
    /// The deadline is already completed and cannot be mutated further.
    DeadlineCompleted(DeadlineId),
}

impl std::fmt::Display for TransitionViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionViolation::Stage { from, to } => {
                write!(f, "stage {} cannot move to {}", from.as_str(), to.as_str())
            }
            TransitionViolation::DeadlineCompleted(id) => {
                write!(f, "deadline {} is already completed", id)
            }
        }
    }
}

/// Errors that can occur in the Lexflow engine.
///
/// - No silent failures: an illegal stage change must reach the caller
/// - The core never logs; the caller decides what to do with the error
/// - The core never panics
#[derive(Debug, Error)]
pub enum LexflowError {
    /// A stage change or deadline mutation is not permitted.
    #[error("Invalid transition: {0}")]
    InvalidTransition(TransitionViolation),

    /// A deadline template is missing a required field.
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// A numeric or date input is outside its meaningful range.
    #[error("Input out of range: {0}")]
    OutOfRangeInput(String),

    /// The requested deadline does not exist in the case.
    #[error("Deadline not found: {0}")]
    DeadlineNotFound(DeadlineId),

    /// No case with this id has been stored.
    #[error("Case not found: {0}")]
    CaseNotFound(CaseId),

    /// A case with this id already exists.
    #[error("Case already exists: {0}")]
    DuplicateCase(CaseId),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration could not be read or is inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl LexflowError {
    /// Shorthand for an illegal stage change.
    #[must_use]
    pub fn stage_transition(from: Stage, to: Stage) -> Self {
        LexflowError::InvalidTransition(TransitionViolation::Stage { from, to })
    }

    /// Shorthand for a mutation of a completed deadline.
    #[must_use]
    pub fn deadline_completed(id: DeadlineId) -> Self {
        LexflowError::InvalidTransition(TransitionViolation::DeadlineCompleted(id))
    }
}

// =============================================================================
// TESTS
// =============================================================================
