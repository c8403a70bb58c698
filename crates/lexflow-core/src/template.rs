//! # Deadline Templates
//!
//! Templates describe the deadlines a stage requires: how long they run,
//! whether they count business or calendar days, and whether they are a
//! statutory obligation.
//!
//! The day-count policy is an explicit template field. Nothing in the engine
//! derives behaviour from a template's display name.
//!
//! Templates arrive from configuration as loosely-typed [`TemplateSpec`]
//! entries and are validated into [`DeadlineTemplate`] before use.

use crate::primitives::MAX_DAY_COUNT;
use crate::system::Stage;
use crate::{DayCountPolicy, DeadlineKind, LexflowError, Priority};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// TEMPLATE
// =============================================================================

/// A validated deadline template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineTemplate {
    pub kind: DeadlineKind,
    pub name: String,
    pub description: String,
    /// Length of the window, interpreted under `day_count`.
    pub days: u32,
    pub day_count: DayCountPolicy,
    /// Stage whose entry starts this deadline.
    pub stage: Stage,
    pub is_legal_requirement: bool,
    pub legal_reference: Option<String>,
    pub priority: Priority,
}

impl DeadlineTemplate {
    /// Check the fields that can still be wrong on a typed template.
    pub fn validate(&self) -> Result<(), LexflowError> {
        if self.name.trim().is_empty() {
            return Err(LexflowError::InvalidTemplate(format!(
                "template {} has an empty name",
                self.kind
            )));
        }
        if i64::from(self.days) > MAX_DAY_COUNT {
            return Err(LexflowError::OutOfRangeInput(format!(
                "template {} runs {} days, maximum is {}",
                self.kind, self.days, MAX_DAY_COUNT
            )));
        }
        Ok(())
    }
}

/// Raw template entry as read from configuration.
///
/// Every field is optional here; [`DeadlineTemplate::try_from`] decides what
/// is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSpec {
    pub kind: Option<DeadlineKind>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub days: Option<i64>,
    pub day_count: Option<DayCountPolicy>,
    pub stage: Option<Stage>,
    pub legal_requirement: Option<bool>,
    pub legal_reference: Option<String>,
    pub priority: Option<Priority>,
}

impl TryFrom<TemplateSpec> for DeadlineTemplate {
    type Error = LexflowError;

    fn try_from(spec: TemplateSpec) -> Result<Self, Self::Error> {
        let kind = spec
            .kind
            .ok_or_else(|| LexflowError::InvalidTemplate("missing kind".to_string()))?;
        let missing =
            |field: &str| LexflowError::InvalidTemplate(format!("{} is missing {}", kind, field));

        let name = spec.name.ok_or_else(|| missing("name"))?;
        let day_count = spec.day_count.ok_or_else(|| missing("day_count"))?;
        let stage = spec.stage.ok_or_else(|| missing("stage"))?;
        let days = spec.days.ok_or_else(|| missing("days"))?;

        if days < 0 {
            return Err(LexflowError::OutOfRangeInput(format!(
                "{} has a negative day count ({})",
                kind, days
            )));
        }
        let days = u32::try_from(days).map_err(|_| {
            LexflowError::OutOfRangeInput(format!("{} day count {} is too large", kind, days))
        })?;

        let template = DeadlineTemplate {
            kind,
            name,
            description: spec.description.unwrap_or_default(),
            days,
            day_count,
            stage,
            is_legal_requirement: spec.legal_requirement.unwrap_or(false),
            legal_reference: spec.legal_reference,
            priority: spec.priority.unwrap_or(Priority::Medium),
        };
        template.validate()?;
        Ok(template)
    }
}

// =============================================================================
// CATALOG
// =============================================================================

/// The set of templates bound to procedure stages, at most one per kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    templates: Vec<DeadlineTemplate>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::statutory()
    }
}

impl TemplateCatalog {
    /// Build a catalog, rejecting invalid templates and duplicate kinds.
    pub fn new(templates: Vec<DeadlineTemplate>) -> Result<Self, LexflowError> {
        let mut seen = BTreeSet::new();
        for template in &templates {
            template.validate()?;
            if !seen.insert(template.kind) {
                return Err(LexflowError::InvalidTemplate(format!(
                    "duplicate template for {}",
                    template.kind
                )));
            }
        }
        Ok(Self { templates })
    }

    /// The statutory deadline bindings.
    ///
    /// Only remedial-measures adoption runs in calendar days; every other
    /// window counts business days.
    #[must_use]
    pub fn statutory() -> Self {
        use DayCountPolicy::{Business, Calendar};

        let t = |kind: DeadlineKind,
                 stage: Stage,
                 days: u32,
                 day_count: DayCountPolicy,
                 priority: Priority,
                 legal_reference: Option<&str>,
                 name: &str,
                 description: &str| DeadlineTemplate {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            days,
            day_count,
            stage,
            is_legal_requirement: legal_reference.is_some(),
            legal_reference: legal_reference.map(str::to_string),
            priority,
        };

        Self {
            templates: vec![
                t(
                    DeadlineKind::RegulatorIntakeNotice,
                    Stage::Filed,
                    3,
                    Business,
                    Priority::High,
                    Some("Harassment Procedure Regulation, art. 4"),
                    "Notify labor authority of complaint",
                    "Inform the labor authority that a complaint was received and whether the employer will investigate it.",
                ),
                t(
                    DeadlineKind::AdmissibilityReview,
                    Stage::Intake,
                    5,
                    Business,
                    Priority::Medium,
                    None,
                    "Admissibility review",
                    "Check the complaint for completeness and decide how it will be handled.",
                ),
                t(
                    DeadlineKind::PrecautionaryMeasuresAdoption,
                    Stage::PrecautionaryMeasures,
                    3,
                    Business,
                    Priority::High,
                    Some("Harassment Procedure Regulation, art. 6"),
                    "Adopt precautionary measures",
                    "Separate the parties, change schedules or provide psychological support.",
                ),
                t(
                    DeadlineKind::ThirdPartyEmployerNotice,
                    Stage::ThirdPartyConduct,
                    3,
                    Business,
                    Priority::Medium,
                    Some("Harassment Procedure Regulation, art. 7"),
                    "Notify third party's employer",
                    "Inform the employer of the accused third party so it can act within its own procedure.",
                ),
                t(
                    DeadlineKind::PrincipalCompanyNotice,
                    Stage::SubcontractorReferral,
                    3,
                    Business,
                    Priority::Medium,
                    Some("Harassment Procedure Regulation, art. 8"),
                    "Notify principal company",
                    "Inform the principal or contractor company along the subcontracting chain.",
                ),
                t(
                    DeadlineKind::InvestigationCompletion,
                    Stage::Investigation,
                    30,
                    Business,
                    Priority::High,
                    Some("Harassment Procedure Regulation, art. 10"),
                    "Complete investigation",
                    "Gather evidence and hear both parties within the statutory investigation window.",
                ),
                t(
                    DeadlineKind::InterviewsCompletion,
                    Stage::Interviews,
                    10,
                    Business,
                    Priority::Medium,
                    None,
                    "Complete interviews",
                    "Interview complainant, accused and witnesses.",
                ),
                t(
                    DeadlineKind::ReportIssuance,
                    Stage::InvestigationReport,
                    5,
                    Business,
                    Priority::High,
                    None,
                    "Issue investigation report",
                    "Draft the report with findings and proposed measures.",
                ),
                t(
                    DeadlineKind::FalseClaimDetermination,
                    Stage::FalseClaimReview,
                    10,
                    Business,
                    Priority::Medium,
                    None,
                    "Determine false claim",
                    "Decide whether the complaint was knowingly false.",
                ),
                t(
                    DeadlineKind::ReportSubmission,
                    Stage::RegulatorNotification,
                    2,
                    Business,
                    Priority::High,
                    Some("Harassment Procedure Regulation, art. 12"),
                    "Submit report to labor authority",
                    "Send the investigation report and its findings to the labor authority.",
                ),
                t(
                    DeadlineKind::RegulatorPronouncement,
                    Stage::RegulatorResponse,
                    30,
                    Business,
                    Priority::Medium,
                    Some("Harassment Procedure Regulation, art. 13"),
                    "Labor authority pronouncement",
                    "Window in which the labor authority may pronounce on the report.",
                ),
                t(
                    DeadlineKind::RemedialMeasuresAdoption,
                    Stage::RemedialMeasures,
                    15,
                    Calendar,
                    Priority::High,
                    Some("Harassment Procedure Regulation, art. 14"),
                    "Adopt remedial measures",
                    "Adopt the measures and sanctions that follow from the findings.",
                ),
                t(
                    DeadlineKind::SanctionsApplication,
                    Stage::Sanctions,
                    10,
                    Business,
                    Priority::Medium,
                    None,
                    "Apply sanctions",
                    "Apply the disciplinary sanctions established in internal regulations.",
                ),
                t(
                    DeadlineKind::RetaliationAssessment,
                    Stage::RetaliationReview,
                    10,
                    Business,
                    Priority::Medium,
                    None,
                    "Assess retaliation risk",
                    "Review whether the complainant or witnesses suffered reprisals.",
                ),
                t(
                    DeadlineKind::FollowUpReview,
                    Stage::FollowUp,
                    20,
                    Business,
                    Priority::Low,
                    None,
                    "Follow-up review",
                    "Verify that adopted measures are in effect.",
                ),
                t(
                    DeadlineKind::ExternalReferral,
                    Stage::DerivedToExternalAuthority,
                    2,
                    Business,
                    Priority::High,
                    Some("Harassment Procedure Regulation, art. 9"),
                    "Refer complaint to external authority",
                    "Forward the complaint and its attachments to the competent authority.",
                ),
            ],
        }
    }

    /// Replace or add templates from configuration entries.
    pub fn with_overrides(
        &self,
        specs: impl IntoIterator<Item = TemplateSpec>,
    ) -> Result<Self, LexflowError> {
        let mut templates = self.templates.clone();
        for spec in specs {
            let template = DeadlineTemplate::try_from(spec)?;
            match templates.iter_mut().find(|t| t.kind == template.kind) {
                Some(existing) => *existing = template,
                None => templates.push(template),
            }
        }
        Self::new(templates)
    }

    /// Templates started by entering `stage`.
    pub fn for_stage(&self, stage: Stage) -> impl Iterator<Item = &DeadlineTemplate> + '_ {
        self.templates.iter().filter(move |t| t.stage == stage)
    }

    /// Look up the template of a kind.
    #[must_use]
    pub fn get(&self, kind: DeadlineKind) -> Option<&DeadlineTemplate> {
        self.templates.iter().find(|t| t.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeadlineTemplate> + '_ {
        self.templates.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
