//! # Property-Based Tests
//!
//! Invariants of the calendar, the deadline engine and the stage workflow,
//! checked over generated inputs with proptest.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use lexflow_core::{
    CaseId, CaseWorkflow, DeadlineEngine, DeadlineId, DeadlineKind, DeadlineStatus, HolidaySet,
    LexflowError, Stage, TemplateCatalog, add_business_days, count_business_days,
    is_business_day,
};
use proptest::collection::vec;
use proptest::prelude::*;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid")
}

fn day(offset: u64) -> NaiveDate {
    base_date()
        .checked_add_days(Days::new(offset))
        .expect("in range")
}

fn instant(offset: u64) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day(offset).and_hms_opt(9, 0, 0).expect("valid"))
}

fn holidays_from(offsets: &[u64]) -> HolidaySet {
    offsets.iter().map(|o| day(*o)).collect()
}

// =============================================================================
// CALENDAR PROPERTIES
// =============================================================================

proptest! {
    /// Counting from a business day to `add(d, n)` sees exactly `n + 1` days.
    #[test]
    fn calendar_round_trip(
        start in 0u64..700,
        n in 0i64..200,
        holiday_offsets in vec(0u64..1000, 0..40)
    ) {
        let holidays = holidays_from(&holiday_offsets);
        let d = day(start);
        prop_assume!(is_business_day(d, &holidays));

        let end = add_business_days(d, n, &holidays).expect("add");
        prop_assert_eq!(count_business_days(d, end, &holidays), n + 1);
    }

    /// A positive addition always lands on a business day.
    #[test]
    fn addition_lands_on_business_day(
        start in 0u64..700,
        n in 1i64..200,
        holiday_offsets in vec(0u64..1000, 0..40)
    ) {
        let holidays = holidays_from(&holiday_offsets);
        let end = add_business_days(day(start), n, &holidays).expect("add");
        prop_assert!(is_business_day(end, &holidays));
        prop_assert!(end > day(start));
    }

    /// The count agrees with checking every day of the span one by one.
    #[test]
    fn count_matches_day_by_day_walk(
        start in 0u64..700,
        len in 0u64..120,
        holiday_offsets in vec(0u64..900, 0..40)
    ) {
        let holidays = holidays_from(&holiday_offsets);
        let (first, last) = (day(start), day(start + len));
        let walked = first
            .iter_days()
            .take_while(|d| *d <= last)
            .filter(|d| is_business_day(*d, &holidays))
            .count() as i64;
        prop_assert_eq!(count_business_days(first, last, &holidays), walked);
    }

    /// Counting backwards never yields a positive number.
    #[test]
    fn reversed_count_is_never_positive(a in 0u64..700, b in 0u64..700) {
        let holidays = HolidaySet::new();
        let (early, late) = (day(a.min(b)), day(a.max(b)));
        prop_assume!(early < late);
        prop_assert!(count_business_days(late, early, &holidays) <= 0);
        prop_assert!(count_business_days(early, late, &holidays) >= 0);
    }
}

// =============================================================================
// DEADLINE PROPERTIES
// =============================================================================

fn investigation_deadline(start: u64) -> lexflow_core::Deadline {
    let template = TemplateCatalog::statutory()
        .get(DeadlineKind::InvestigationCompletion)
        .cloned()
        .expect("template");
    DeadlineEngine::new()
        .initialize(&template, DeadlineId(1), instant(start), &HolidaySet::new())
        .expect("initialize")
}

proptest! {
    /// Each extension strictly moves the due date forward and the original
    /// due date is the one before the first extension.
    #[test]
    fn extension_is_monotonic(
        start in 0u64..300,
        extensions in vec(1i64..40, 1..6)
    ) {
        let engine = DeadlineEngine::new();
        let holidays = HolidaySet::new();
        let mut deadline = investigation_deadline(start);
        let first_end = deadline.end_date;

        for days in extensions {
            let previous = deadline.end_date;
            deadline = engine
                .extend(&deadline, days, "reason", "approver", instant(start), &holidays)
                .expect("extend");
            prop_assert!(deadline.end_date > previous);
            prop_assert_eq!(deadline.original_end_date, Some(first_end));
        }
    }

    /// Recomputing twice at the same instant changes nothing the second time.
    #[test]
    fn recompute_is_idempotent(start in 0u64..300, elapsed in 0u64..120) {
        let engine = DeadlineEngine::new();
        let holidays = HolidaySet::new();
        let deadline = investigation_deadline(start);
        let now = instant(start + elapsed);

        let once = engine.recompute_status(&deadline, now, &holidays);
        let twice = engine.recompute_status(&once, now, &holidays);
        prop_assert_eq!(once, twice);
    }

    /// A completed deadline is never reclassified, whatever the clock says.
    #[test]
    fn completed_is_sticky(start in 0u64..300, later in 0u64..2000) {
        let engine = DeadlineEngine::new();
        let done = engine
            .complete(&investigation_deadline(start), "officer", instant(start))
            .expect("complete");

        let recomputed = engine.recompute_status(&done, instant(start + later), &HolidaySet::new());
        prop_assert_eq!(recomputed.status, DeadlineStatus::Completed);
        prop_assert_eq!(recomputed, done);
    }

    /// Progress always ends up within 0..=100.
    #[test]
    fn progress_is_clamped(pct in any::<i64>()) {
        let updated = DeadlineEngine::new().update_progress(&investigation_deadline(0), pct);
        prop_assert!(updated.progress_percentage <= 100);
    }
}

// =============================================================================
// WORKFLOW PROPERTIES
// =============================================================================

proptest! {
    /// Any target outside the adjacency table is rejected and the input
    /// state is left exactly as it was.
    #[test]
    fn transition_legality(from_idx in 0usize..18, to_idx in 0usize..18) {
        let workflow = CaseWorkflow::default();
        let holidays = HolidaySet::new();
        let from = Stage::ALL[from_idx];
        let to = Stage::ALL[to_idx];

        let mut state = workflow
            .open_case(CaseId::new("C-P"), "clerk", instant(10), &holidays)
            .expect("open");
        state.current_stage = from;
        let before = state.clone();

        let result = workflow.transition(&state, to, "clerk", instant(11), None, &holidays);
        if workflow.table().permits(from, to) {
            let next = result.expect("permitted transition");
            prop_assert_eq!(next.current_stage, to);
            prop_assert_eq!(next.stage_history.len(), before.stage_history.len() + 1);
        } else {
            prop_assert!(matches!(result, Err(LexflowError::InvalidTransition(_))), "expected InvalidTransition");
        }
        prop_assert_eq!(state, before);
    }
}
