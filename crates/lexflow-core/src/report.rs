//! # Portfolio Reporter
//!
//! Aggregates deadline statuses across many cases.
//!
//! Rates are integer basis points (`0..=10_000`); display layers divide by
//! 100 for a percentage.

use crate::deadline::Deadline;
use crate::primitives::RATE_SCALE;
use crate::system::Stage;
use crate::workflow::CaseWorkflowState;
use crate::{CaseId, DeadlineId, DeadlineKind, DeadlineStatus, Priority};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// The most urgent open deadline of a portfolio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextCriticalDeadline {
    pub case_id: CaseId,
    pub deadline_id: DeadlineId,
    pub kind: DeadlineKind,
    pub name: String,
    pub end_date: NaiveDate,
    pub days_remaining: i64,
    pub status: DeadlineStatus,
    pub priority: Priority,
}

impl NextCriticalDeadline {
    fn from_deadline(case_id: &CaseId, deadline: &Deadline) -> Self {
        Self {
            case_id: case_id.clone(),
            deadline_id: deadline.id,
            kind: deadline.kind,
            name: deadline.name.clone(),
            end_date: deadline.end_date,
            days_remaining: deadline.days_remaining,
            status: deadline.status,
            priority: deadline.priority,
        }
    }
}

/// Portfolio-wide deadline counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub cases: usize,
    pub cases_by_stage: BTreeMap<Stage, usize>,
    pub total: usize,
    pub completed: usize,
    pub expired: usize,
    pub critical: usize,
    pub warning: usize,
    pub extended: usize,
    pub on_track: usize,
    /// Deadlines that have been granted at least one extension, whatever
    /// their current status.
    pub with_extensions: usize,
    /// `completed / total`, in basis points.
    pub completion_rate: u64,
    /// `(completed + on_track) / total`, in basis points.
    pub compliance_rate: u64,
    pub next_critical_deadline: Option<NextCriticalDeadline>,
}

/// Summarize deadline statuses over a set of cases.
///
/// Statuses are taken as stored; callers recompute first when they need a
/// view as of a particular instant.
#[must_use]
pub fn summarize(cases: &[CaseWorkflowState]) -> PortfolioSummary {
    let mut summary = PortfolioSummary {
        cases: cases.len(),
        ..PortfolioSummary::default()
    };

    for case in cases {
        *summary.cases_by_stage.entry(case.current_stage).or_default() += 1;
        for deadline in &case.deadlines {
            summary.total += 1;
            if deadline.was_extended() {
                summary.with_extensions += 1;
            }
            match deadline.status {
                DeadlineStatus::Completed => summary.completed += 1,
                DeadlineStatus::Expired => summary.expired += 1,
                DeadlineStatus::Critical => summary.critical += 1,
                DeadlineStatus::Warning => summary.warning += 1,
                DeadlineStatus::Extended => summary.extended += 1,
                DeadlineStatus::OnTrack => summary.on_track += 1,
            }
        }
    }

    summary.completion_rate = rate(summary.completed, summary.total);
    summary.compliance_rate = rate(summary.completed + summary.on_track, summary.total);
    summary.next_critical_deadline = cases
        .iter()
        .flat_map(|case| case.deadlines.iter().map(move |d| (&case.case_id, d)))
        .filter(|(_, d)| d.is_open())
        .min_by_key(|(case_id, d)| (d.days_remaining, Reverse(d.priority), *case_id, d.id))
        .map(|(case_id, d)| NextCriticalDeadline::from_deadline(case_id, d));

    summary
}

/// `part / total` in basis points, 0 for an empty portfolio.
fn rate(part: usize, total: usize) -> u64 {
    if total == 0 {
        return 0;
    }
    (part as u64).saturating_mul(RATE_SCALE) / total as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::HolidaySet;
    use crate::workflow::CaseWorkflow;
    use chrono::{TimeZone, Utc};

    fn case_with_statuses(id: &str, statuses: &[DeadlineStatus]) -> CaseWorkflowState {
        let workflow = CaseWorkflow::default();
        let now = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).single().expect("valid");
        let mut state = workflow
            .open_case(CaseId::new(id), "clerk", now, &HolidaySet::new())
            .expect("open");
        let template = state.deadlines[0].clone();
        state.deadlines = statuses
            .iter()
            .enumerate()
            .map(|(i, status)| {
                let mut d = template.clone();
                d.id = DeadlineId(i as u64 + 1);
                d.status = *status;
                d
            })
            .collect();
        state
    }

    #[test]
    fn empty_portfolio_has_zero_rates() {
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.completion_rate, 0);
        assert_eq!(summary.compliance_rate, 0);
        assert!(summary.next_critical_deadline.is_none());
    }

    #[test]
    fn counts_and_rates() {
        let case = case_with_statuses(
            "C-1",
            &[
                DeadlineStatus::Completed,
                DeadlineStatus::OnTrack,
                DeadlineStatus::Warning,
                DeadlineStatus::Extended,
            ],
        );
        let summary = summarize(&[case]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.completion_rate, 2_500);
        assert_eq!(summary.compliance_rate, 5_000);
        assert_eq!(summary.cases_by_stage.get(&Stage::Filed), Some(&1));
    }

    #[test]
    fn extensions_survive_recomputation() {
        let workflow = CaseWorkflow::default();
        let holidays = HolidaySet::new();
        let granted = Utc.with_ymd_and_hms(2025, 3, 4, 9, 0, 0).single().expect("valid");
        let state = case_with_statuses("C-1", &[DeadlineStatus::OnTrack]);
        let state = workflow
            .extend_deadline(&state, DeadlineId(1), 5, "backlog", "director", granted, &holidays)
            .expect("extend");

        let before = summarize(std::slice::from_ref(&state));
        assert_eq!(before.extended, 1);
        assert_eq!(before.with_extensions, 1);

        let later = Utc.with_ymd_and_hms(2025, 3, 5, 9, 0, 0).single().expect("valid");
        let recomputed = workflow.recompute_all(&state, later, &holidays);
        let after = summarize(&[recomputed]);
        assert_eq!(after.extended, 0);
        assert_eq!(after.with_extensions, 1);
    }

    #[test]
    fn next_critical_prefers_fewest_days_then_priority() {
        let mut a = case_with_statuses("C-A", &[DeadlineStatus::Warning]);
        a.deadlines[0].days_remaining = 2;
        a.deadlines[0].priority = Priority::Low;

        let mut b = case_with_statuses("C-B", &[DeadlineStatus::Warning, DeadlineStatus::Expired]);
        b.deadlines[0].days_remaining = 2;
        b.deadlines[0].priority = Priority::High;
        b.deadlines[1].days_remaining = -5;

        let next = summarize(&[a, b]).next_critical_deadline.expect("next");
        assert_eq!(next.case_id, CaseId::new("C-B"));
        assert_eq!(next.deadline_id, DeadlineId(1));
    }

    #[test]
    fn next_critical_ties_break_on_case_then_id() {
        let mut a = case_with_statuses("C-2", &[DeadlineStatus::Critical]);
        a.deadlines[0].days_remaining = 1;
        let mut b = case_with_statuses("C-1", &[DeadlineStatus::Critical, DeadlineStatus::Critical]);
        b.deadlines[0].days_remaining = 1;
        b.deadlines[1].days_remaining = 1;

        let next = summarize(&[a, b]).next_critical_deadline.expect("next");
        assert_eq!(next.case_id, CaseId::new("C-1"));
        assert_eq!(next.deadline_id, DeadlineId(1));
    }
}
