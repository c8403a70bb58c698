//! # Procedure Stages
//!
//! The named steps of the harassment-investigation procedure and the
//! adjacency table that says which step may follow which.
//!
//! ## Stage Map
//!
//! | Stage | Kind |
//! |-------|------|
//! | filed → intake → investigation → investigation_report | main line |
//! | regulator_notification → regulator_response | regulator |
//! | remedial_measures → sanctions → follow_up → closed | resolution |
//! | precautionary_measures | interim |
//! | third_party_conduct, subcontractor_referral, false_claim_review, retaliation_review | branch variants |
//! | abandoned, derived_to_external_authority | short-circuits to closed |
//!
//! Branches are ordinary stages with their own successor sets. The table is
//! plain data, so an amended procedure is a configuration change rather
//! than a change to the transition logic.

use crate::LexflowError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// STAGE ENUM
// =============================================================================

/// A step of the legally defined case procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Filed,
    Intake,
    PrecautionaryMeasures,
    ThirdPartyConduct,
    SubcontractorReferral,
    Investigation,
    Interviews,
    InvestigationReport,
    FalseClaimReview,
    RegulatorNotification,
    RegulatorResponse,
    RemedialMeasures,
    Sanctions,
    RetaliationReview,
    FollowUp,
    Abandoned,
    DerivedToExternalAuthority,
    Closed,
}

impl Stage {
    /// Every stage, in procedure order.
    pub const ALL: [Stage; 18] = [
        Stage::Filed,
        Stage::Intake,
        Stage::PrecautionaryMeasures,
        Stage::ThirdPartyConduct,
        Stage::SubcontractorReferral,
        Stage::Investigation,
        Stage::Interviews,
        Stage::InvestigationReport,
        Stage::FalseClaimReview,
        Stage::RegulatorNotification,
        Stage::RegulatorResponse,
        Stage::RemedialMeasures,
        Stage::Sanctions,
        Stage::RetaliationReview,
        Stage::FollowUp,
        Stage::Abandoned,
        Stage::DerivedToExternalAuthority,
        Stage::Closed,
    ];

    /// Stable machine name (matches the serde representation).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Filed => "filed",
            Stage::Intake => "intake",
            Stage::PrecautionaryMeasures => "precautionary_measures",
            Stage::ThirdPartyConduct => "third_party_conduct",
            Stage::SubcontractorReferral => "subcontractor_referral",
            Stage::Investigation => "investigation",
            Stage::Interviews => "interviews",
            Stage::InvestigationReport => "investigation_report",
            Stage::FalseClaimReview => "false_claim_review",
            Stage::RegulatorNotification => "regulator_notification",
            Stage::RegulatorResponse => "regulator_response",
            Stage::RemedialMeasures => "remedial_measures",
            Stage::Sanctions => "sanctions",
            Stage::RetaliationReview => "retaliation_review",
            Stage::FollowUp => "follow_up",
            Stage::Abandoned => "abandoned",
            Stage::DerivedToExternalAuthority => "derived_to_external_authority",
            Stage::Closed => "closed",
        }
    }

    /// Human-readable stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Filed => "Complaint Filed",
            Stage::Intake => "Intake Review",
            Stage::PrecautionaryMeasures => "Precautionary Measures",
            Stage::ThirdPartyConduct => "Third-Party Conduct",
            Stage::SubcontractorReferral => "Subcontracting Chain Referral",
            Stage::Investigation => "Investigation",
            Stage::Interviews => "Interviews",
            Stage::InvestigationReport => "Investigation Report",
            Stage::FalseClaimReview => "False Claim Review",
            Stage::RegulatorNotification => "Regulator Notification",
            Stage::RegulatorResponse => "Regulator Response",
            Stage::RemedialMeasures => "Remedial Measures",
            Stage::Sanctions => "Sanctions",
            Stage::RetaliationReview => "Retaliation Review",
            Stage::FollowUp => "Follow-Up",
            Stage::Abandoned => "Abandoned",
            Stage::DerivedToExternalAuthority => "Derived to External Authority",
            Stage::Closed => "Closed",
        }
    }

    /// Special-case branch variants of the procedure.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Stage::ThirdPartyConduct
                | Stage::SubcontractorReferral
                | Stage::FalseClaimReview
                | Stage::RetaliationReview
        )
    }

    /// Documented ways to close a case without a full investigation.
    #[must_use]
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, Stage::Abandoned | Stage::DerivedToExternalAuthority)
    }

    /// Check if this stage is terminal (Closed).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Closed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.as_str(), self.name())
    }
}

impl std::str::FromStr for Stage {
    type Err = LexflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == wanted)
            .ok_or_else(|| LexflowError::OutOfRangeInput(format!("Unknown stage: {}", s)))
    }
}

// =============================================================================
// TRANSITION TABLE
// =============================================================================

/// Adjacency table of permitted stage successors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionTable {
    successors: BTreeMap<Stage, BTreeSet<Stage>>,
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::statutory()
    }
}

impl TransitionTable {
    /// The procedure as laid down by statute.
    #[must_use]
    pub fn statutory() -> Self {
        use Stage::*;

        Self::from_edges([
            (Filed, vec![Intake, Abandoned, DerivedToExternalAuthority]),
            (
                Intake,
                vec![
                    PrecautionaryMeasures,
                    Investigation,
                    ThirdPartyConduct,
                    SubcontractorReferral,
                    Abandoned,
                    DerivedToExternalAuthority,
                ],
            ),
            (
                PrecautionaryMeasures,
                vec![Investigation, DerivedToExternalAuthority],
            ),
            (
                ThirdPartyConduct,
                vec![
                    PrecautionaryMeasures,
                    Investigation,
                    DerivedToExternalAuthority,
                ],
            ),
            (
                SubcontractorReferral,
                vec![
                    PrecautionaryMeasures,
                    Investigation,
                    DerivedToExternalAuthority,
                ],
            ),
            (Investigation, vec![Interviews, InvestigationReport]),
            (Interviews, vec![InvestigationReport]),
            (
                InvestigationReport,
                vec![RegulatorNotification, FalseClaimReview],
            ),
            (FalseClaimReview, vec![RegulatorNotification, Sanctions]),
            (RegulatorNotification, vec![RegulatorResponse]),
            (RegulatorResponse, vec![RemedialMeasures, Investigation]),
            (
                RemedialMeasures,
                vec![Sanctions, RetaliationReview, FollowUp, Closed],
            ),
            (Sanctions, vec![RetaliationReview, FollowUp, Closed]),
            (RetaliationReview, vec![Sanctions, FollowUp, Closed]),
            (FollowUp, vec![Closed]),
            (Abandoned, vec![Closed]),
            (DerivedToExternalAuthority, vec![Closed]),
        ])
    }

    /// Build a table from `(stage, successors)` pairs.
    ///
    /// Stages that never appear as a key have no successors.
    #[must_use]
    pub fn from_edges(edges: impl IntoIterator<Item = (Stage, Vec<Stage>)>) -> Self {
        let mut successors: BTreeMap<Stage, BTreeSet<Stage>> = BTreeMap::new();
        for (from, targets) in edges {
            successors.entry(from).or_default().extend(targets);
        }
        Self { successors }
    }

    /// Permitted successors of a stage, in stage order.
    pub fn successors(&self, stage: Stage) -> impl Iterator<Item = Stage> + '_ {
        self.successors
            .get(&stage)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Check whether `from -> to` is a permitted transition.
    #[must_use]
    pub fn permits(&self, from: Stage, to: Stage) -> bool {
        self.successors
            .get(&from)
            .is_some_and(|set| set.contains(&to))
    }

    /// Validate a transition, returning `InvalidTransition` if it is not permitted.
    pub fn check(&self, from: Stage, to: Stage) -> Result<(), LexflowError> {
        if self.permits(from, to) {
            Ok(())
        } else {
            Err(LexflowError::stage_transition(from, to))
        }
    }

    /// All edges of the table, in deterministic order.
    pub fn edges(&self) -> impl Iterator<Item = (Stage, Stage)> + '_ {
        self.successors
            .iter()
            .flat_map(|(from, set)| set.iter().map(move |to| (*from, *to)))
    }

    /// Number of permitted transitions.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.successors.values().map(BTreeSet::len).sum()
    }

    /// Check the table for structural defects.
    ///
    /// A usable table lets `Closed` be reached from `Filed` and gives
    /// `Closed` no successors.
    pub fn validate(&self) -> Result<(), LexflowError> {
        if self.successors(Stage::Closed).next().is_some() {
            return Err(LexflowError::ConfigError(
                "closed must not have successors".to_string(),
            ));
        }
        if !self.reachable_from(Stage::Filed).contains(&Stage::Closed) {
            return Err(LexflowError::ConfigError(
                "closed is not reachable from filed".to_string(),
            ));
        }
        Ok(())
    }

    /// Stages reachable from `start` (including `start`).
    #[must_use]
    pub fn reachable_from(&self, start: Stage) -> BTreeSet<Stage> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(stage) = stack.pop() {
            if seen.insert(stage) {
                stack.extend(self.successors(stage));
            }
        }
        seen
    }
}

// =============================================================================
// TESTS
// =============================================================================
