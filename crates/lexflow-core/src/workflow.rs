//! # Stage Workflow
//!
//! The case workflow service: it moves a case through the procedure's stages,
//! starts the deadlines each stage requires, and routes deadline operations
//! to the [`DeadlineEngine`] by id.
//!
//! [`CaseWorkflow`] holds only immutable data (adjacency table, template
//! catalog, thresholds). Every operation takes a [`CaseWorkflowState`] by
//! reference and returns a new one, so a failed operation never leaves a
//! half-updated case behind.

use crate::calendar::HolidaySet;
use crate::deadline::{Deadline, DeadlineEngine};
use crate::primitives::MAX_NOTES_LENGTH;
use crate::system::{Stage, TransitionTable};
use crate::template::TemplateCatalog;
use crate::{CaseId, DeadlineId, LexflowError, NotificationChannel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// CASE STATE
// =============================================================================

/// One entry of a case's stage history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransitionRecord {
    pub stage: Stage,
    pub timestamp: DateTime<Utc>,
    pub actor_id: String,
    pub notes: Option<String>,
}

/// Snapshot of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseWorkflowState {
    pub case_id: CaseId,
    pub current_stage: Stage,
    /// Append-only; the first record is the filing.
    pub stage_history: Vec<StageTransitionRecord>,
    /// Ordered by id; never shrinks.
    pub deadlines: Vec<Deadline>,
}

impl CaseWorkflowState {
    /// Look up a deadline by id.
    #[must_use]
    pub fn deadline(&self, id: DeadlineId) -> Option<&Deadline> {
        self.deadlines.iter().find(|d| d.id == id)
    }

    /// Deadlines of `stage` that are not completed.
    #[must_use]
    pub fn active_deadlines_for_stage(&self, stage: Stage) -> Vec<&Deadline> {
        self.deadlines
            .iter()
            .filter(|d| d.associated_stage == stage && !d.is_completed())
            .collect()
    }

    /// Id the next started deadline will receive.
    #[must_use]
    pub fn next_deadline_id(&self) -> DeadlineId {
        self.deadlines
            .iter()
            .map(|d| d.id)
            .max()
            .map(DeadlineId::next)
            .unwrap_or(DeadlineId(1))
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.current_stage.is_terminal()
    }

    /// Timestamp of the most recent stage change.
    #[must_use]
    pub fn last_transition_at(&self) -> Option<DateTime<Utc>> {
        self.stage_history.last().map(|r| r.timestamp)
    }
}

// =============================================================================
// WORKFLOW SERVICE
// =============================================================================

/// Case workflow service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseWorkflow {
    table: TransitionTable,
    catalog: TemplateCatalog,
    engine: DeadlineEngine,
}

impl CaseWorkflow {
    /// Build a workflow from configured data.
    ///
    /// Rejects adjacency tables in which a case can never be closed.
    pub fn new(
        table: TransitionTable,
        catalog: TemplateCatalog,
        engine: DeadlineEngine,
    ) -> Result<Self, LexflowError> {
        table.validate()?;
        Ok(Self {
            table,
            catalog,
            engine,
        })
    }

    #[must_use]
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    #[must_use]
    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn engine(&self) -> &DeadlineEngine {
        &self.engine
    }

    // -------------------------------------------------------------------------
    // STAGE OPERATIONS
    // -------------------------------------------------------------------------

    /// File a new case: stage `filed`, one history record, and the deadlines
    /// the filing starts.
    pub fn open_case(
        &self,
        case_id: CaseId,
        actor_id: &str,
        now: DateTime<Utc>,
        holidays: &HolidaySet,
    ) -> Result<CaseWorkflowState, LexflowError> {
        let mut state = CaseWorkflowState {
            case_id,
            current_stage: Stage::Filed,
            stage_history: vec![StageTransitionRecord {
                stage: Stage::Filed,
                timestamp: now,
                actor_id: actor_id.to_string(),
                notes: None,
            }],
            deadlines: Vec::new(),
        };
        self.start_stage_deadlines(&mut state, Stage::Filed, now, holidays)?;
        Ok(state)
    }

    /// Move a case to `target`.
    ///
    /// Deadline kinds that still have an open (neither completed nor
    /// expired) deadline in the case are not started a second time.
    pub fn transition(
        &self,
        state: &CaseWorkflowState,
        target: Stage,
        actor_id: &str,
        now: DateTime<Utc>,
        notes: Option<&str>,
        holidays: &HolidaySet,
    ) -> Result<CaseWorkflowState, LexflowError> {
        self.table.check(state.current_stage, target)?;
        if let Some(text) = notes {
            check_notes(text)?;
        }

        let mut next = state.clone();
        next.current_stage = target;
        next.stage_history.push(StageTransitionRecord {
            stage: target,
            timestamp: now,
            actor_id: actor_id.to_string(),
            notes: notes.map(str::to_string),
        });
        self.start_stage_deadlines(&mut next, target, now, holidays)?;
        Ok(next)
    }

    /// Recompute every deadline of the case against `now`.
    #[must_use]
    pub fn recompute_all(
        &self,
        state: &CaseWorkflowState,
        now: DateTime<Utc>,
        holidays: &HolidaySet,
    ) -> CaseWorkflowState {
        let mut next = state.clone();
        next.deadlines = state
            .deadlines
            .iter()
            .map(|d| self.engine.recompute_status(d, now, holidays))
            .collect();
        next
    }

    /// Deadlines of `stage` that are not completed.
    #[must_use]
    pub fn active_deadlines_for_stage<'a>(
        &self,
        state: &'a CaseWorkflowState,
        stage: Stage,
    ) -> Vec<&'a Deadline> {
        state.active_deadlines_for_stage(stage)
    }

    fn start_stage_deadlines(
        &self,
        state: &mut CaseWorkflowState,
        stage: Stage,
        now: DateTime<Utc>,
        holidays: &HolidaySet,
    ) -> Result<(), LexflowError> {
        for template in self.catalog.for_stage(stage) {
            let already_open = state
                .deadlines
                .iter()
                .any(|d| d.kind == template.kind && d.is_open());
            if already_open {
                continue;
            }
            let id = state.next_deadline_id();
            let deadline = self.engine.initialize(template, id, now, holidays)?;
            state.deadlines.push(deadline);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // DEADLINE OPERATIONS (by id)
    // -------------------------------------------------------------------------

    pub fn complete_deadline(
        &self,
        state: &CaseWorkflowState,
        id: DeadlineId,
        completed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<CaseWorkflowState, LexflowError> {
        replace_deadline(state, id, |d| self.engine.complete(d, completed_by, now))
    }

    pub fn extend_deadline(
        &self,
        state: &CaseWorkflowState,
        id: DeadlineId,
        additional_days: i64,
        reason: &str,
        approved_by: &str,
        now: DateTime<Utc>,
        holidays: &HolidaySet,
    ) -> Result<CaseWorkflowState, LexflowError> {
        replace_deadline(state, id, |d| {
            self.engine
                .extend(d, additional_days, reason, approved_by, now, holidays)
        })
    }

    pub fn update_progress(
        &self,
        state: &CaseWorkflowState,
        id: DeadlineId,
        percentage: i64,
    ) -> Result<CaseWorkflowState, LexflowError> {
        replace_deadline(state, id, |d| Ok(self.engine.update_progress(d, percentage)))
    }

    pub fn record_notification(
        &self,
        state: &CaseWorkflowState,
        id: DeadlineId,
        recipient: &str,
        channel: NotificationChannel,
        now: DateTime<Utc>,
    ) -> Result<CaseWorkflowState, LexflowError> {
        replace_deadline(state, id, |d| {
            Ok(self.engine.record_notification(d, recipient, channel, now))
        })
    }

    pub fn set_notes(
        &self,
        state: &CaseWorkflowState,
        id: DeadlineId,
        notes: &str,
    ) -> Result<CaseWorkflowState, LexflowError> {
        check_notes(notes)?;
        replace_deadline(state, id, |d| Ok(self.engine.set_notes(d, notes)))
    }
}

fn replace_deadline(
    state: &CaseWorkflowState,
    id: DeadlineId,
    op: impl FnOnce(&Deadline) -> Result<Deadline, LexflowError>,
) -> Result<CaseWorkflowState, LexflowError> {
    let index = state
        .deadlines
        .iter()
        .position(|d| d.id == id)
        .ok_or(LexflowError::DeadlineNotFound(id))?;
    let updated = op(&state.deadlines[index])?;

    let mut next = state.clone();
    next.deadlines[index] = updated;
    Ok(next)
}

fn check_notes(notes: &str) -> Result<(), LexflowError> {
    if notes.len() > MAX_NOTES_LENGTH {
        return Err(LexflowError::OutOfRangeInput(format!(
            "notes are {} bytes, maximum is {}",
            notes.len(),
            MAX_NOTES_LENGTH
        )));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeadlineKind, DeadlineStatus};
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).single().expect("valid")
    }

    fn opened() -> CaseWorkflowState {
        CaseWorkflow::default()
            .open_case(CaseId::new("C-1"), "clerk", at(2025, 3, 3), &HolidaySet::new())
            .expect("open")
    }

    #[test]
    fn open_case_starts_filing_deadlines() {
        let state = opened();
        assert_eq!(state.current_stage, Stage::Filed);
        assert_eq!(state.stage_history.len(), 1);
        assert_eq!(state.deadlines.len(), 1);
        assert_eq!(state.deadlines[0].kind, DeadlineKind::RegulatorIntakeNotice);
        assert_eq!(state.deadlines[0].id, DeadlineId(1));
    }

    #[test]
    fn transition_appends_history_and_deadlines() {
        let workflow = CaseWorkflow::default();
        let state = workflow
            .transition(
                &opened(),
                Stage::Intake,
                "clerk",
                at(2025, 3, 4),
                Some("admitted"),
                &HolidaySet::new(),
            )
            .expect("transition");

        assert_eq!(state.current_stage, Stage::Intake);
        assert_eq!(state.stage_history.len(), 2);
        assert_eq!(state.stage_history[1].notes.as_deref(), Some("admitted"));
        assert_eq!(state.deadlines.len(), 2);
        assert_eq!(state.deadlines[1].kind, DeadlineKind::AdmissibilityReview);
        assert_eq!(state.deadlines[1].id, DeadlineId(2));
    }

    #[test]
    fn illegal_transition_leaves_state_untouched() {
        let workflow = CaseWorkflow::default();
        let state = opened();
        let before = state.clone();

        let result = workflow.transition(
            &state,
            Stage::Closed,
            "clerk",
            at(2025, 3, 4),
            None,
            &HolidaySet::new(),
        );
        assert!(matches!(result, Err(LexflowError::InvalidTransition(_))));
        assert_eq!(state, before);
    }

    #[test]
    fn reentering_a_stage_does_not_duplicate_open_deadlines() {
        let workflow = CaseWorkflow::default();
        let holidays = HolidaySet::new();
        let path = [
            Stage::Intake,
            Stage::Investigation,
            Stage::InvestigationReport,
            Stage::RegulatorNotification,
            Stage::RegulatorResponse,
            Stage::Investigation,
        ];

        let mut state = opened();
        for stage in path {
            state = workflow
                .transition(&state, stage, "clerk", at(2025, 3, 5), None, &holidays)
                .expect("transition");
        }

        let investigations = state
            .deadlines
            .iter()
            .filter(|d| d.kind == DeadlineKind::InvestigationCompletion)
            .count();
        assert_eq!(investigations, 1);
    }

    #[test]
    fn reentering_after_completion_starts_a_fresh_deadline() {
        let workflow = CaseWorkflow::default();
        let holidays = HolidaySet::new();
        let mut state = opened();
        for stage in [Stage::Intake, Stage::Investigation] {
            state = workflow
                .transition(&state, stage, "clerk", at(2025, 3, 5), None, &holidays)
                .expect("transition");
        }
        let investigation = state
            .active_deadlines_for_stage(Stage::Investigation)
            .first()
            .map(|d| d.id)
            .expect("investigation deadline");
        state = workflow
            .complete_deadline(&state, investigation, "investigator", at(2025, 4, 1))
            .expect("complete");

        for stage in [
            Stage::InvestigationReport,
            Stage::RegulatorNotification,
            Stage::RegulatorResponse,
            Stage::Investigation,
        ] {
            state = workflow
                .transition(&state, stage, "clerk", at(2025, 4, 2), None, &holidays)
                .expect("transition");
        }

        let active = workflow.active_deadlines_for_stage(&state, Stage::Investigation);
        assert_eq!(active.len(), 1);
        assert_ne!(active[0].id, investigation);
    }

    #[test]
    fn reentering_after_expiry_starts_a_fresh_deadline() {
        let workflow = CaseWorkflow::default();
        let holidays = HolidaySet::new();
        let mut state = opened();
        for stage in [
            Stage::Intake,
            Stage::Investigation,
            Stage::InvestigationReport,
            Stage::RegulatorNotification,
            Stage::RegulatorResponse,
        ] {
            state = workflow
                .transition(&state, stage, "clerk", at(2025, 3, 5), None, &holidays)
                .expect("transition");
        }

        let reopened_at = at(2025, 6, 2);
        state = workflow.recompute_all(&state, reopened_at, &holidays);
        let expired = state
            .deadlines
            .iter()
            .find(|d| d.kind == DeadlineKind::InvestigationCompletion)
            .map(|d| d.id)
            .expect("investigation deadline");
        assert_eq!(
            state.deadline(expired).map(|d| d.status),
            Some(DeadlineStatus::Expired)
        );

        state = workflow
            .transition(&state, Stage::Investigation, "clerk", reopened_at, None, &holidays)
            .expect("re-investigate");

        let fresh: Vec<&Deadline> = state
            .deadlines
            .iter()
            .filter(|d| d.kind == DeadlineKind::InvestigationCompletion && d.is_open())
            .collect();
        assert_eq!(fresh.len(), 1);
        assert_ne!(fresh[0].id, expired);
        assert_eq!(fresh[0].start_date, reopened_at);
        assert!(fresh[0].end_date > reopened_at.date_naive());
    }

    #[test]
    fn recompute_all_is_idempotent() {
        let workflow = CaseWorkflow::default();
        let holidays = HolidaySet::new();
        let now = at(2025, 3, 12);

        let once = workflow.recompute_all(&opened(), now, &holidays);
        let twice = workflow.recompute_all(&once, now, &holidays);
        assert_eq!(once, twice);
        assert_eq!(once.deadlines[0].status, DeadlineStatus::Expired);
    }

    #[test]
    fn unknown_deadline_id_is_not_found() {
        let workflow = CaseWorkflow::default();
        let result = workflow.update_progress(&opened(), DeadlineId(99), 10);
        assert!(matches!(result, Err(LexflowError::DeadlineNotFound(DeadlineId(99)))));
    }

    #[test]
    fn deadline_operations_route_by_id() {
        let workflow = CaseWorkflow::default();
        let holidays = HolidaySet::new();
        let id = DeadlineId(1);

        let state = workflow.update_progress(&opened(), id, 40).expect("progress");
        let state = workflow
            .record_notification(&state, id, "hr@example.org", NotificationChannel::Email, at(2025, 3, 4))
            .expect("notify");
        let state = workflow.set_notes(&state, id, "awaiting signature").expect("notes");
        let state = workflow
            .extend_deadline(&state, id, 2, "holiday backlog", "manager", at(2025, 3, 4), &holidays)
            .expect("extend");

        let deadline = state.deadline(id).expect("deadline");
        assert_eq!(deadline.progress_percentage, 40);
        assert_eq!(deadline.notifications_sent.len(), 1);
        assert_eq!(deadline.notes, "awaiting signature");
        assert_eq!(deadline.status, DeadlineStatus::Extended);
    }

    #[test]
    fn oversized_notes_rejected() {
        let workflow = CaseWorkflow::default();
        let long = "x".repeat(MAX_NOTES_LENGTH + 1);
        assert!(matches!(
            workflow.set_notes(&opened(), DeadlineId(1), &long),
            Err(LexflowError::OutOfRangeInput(_))
        ));
    }

    #[test]
    fn workflow_rejects_table_without_closure() {
        let table = TransitionTable::from_edges([(Stage::Filed, vec![Stage::Intake])]);
        let result = CaseWorkflow::new(table, TemplateCatalog::statutory(), DeadlineEngine::new());
        assert!(matches!(result, Err(LexflowError::ConfigError(_))));
    }

    #[test]
    fn closed_case_accepts_no_transition() {
        let workflow = CaseWorkflow::default();
        let holidays = HolidaySet::new();
        let mut state = opened();
        for stage in [Stage::Abandoned, Stage::Closed] {
            state = workflow
                .transition(&state, stage, "clerk", at(2025, 3, 4), None, &holidays)
                .expect("transition");
        }
        assert!(state.is_closed());
        for target in Stage::ALL {
            assert!(
                workflow
                    .transition(&state, target, "clerk", at(2025, 3, 5), None, &holidays)
                    .is_err()
            );
        }
    }
}
