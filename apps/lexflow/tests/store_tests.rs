//! Integration tests for the redb case store.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{DateTime, TimeZone, Utc};
use lexflow::store::CaseStore;
use lexflow_core::{
    CaseId, CaseWorkflow, CaseWorkflowState, DeadlineId, HolidaySet, LexflowError, Stage,
};
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
}

fn open(workflow: &CaseWorkflow, id: &str) -> CaseWorkflowState {
    workflow
        .open_case(CaseId::new(id), "clerk", now(), &HolidaySet::default())
        .unwrap()
}

fn temp_store() -> (TempDir, CaseStore) {
    let dir = TempDir::new().unwrap();
    let store = CaseStore::open(dir.path().join("cases.db")).unwrap();
    (dir, store)
}

#[test]
fn test_create_and_load() {
    let (_dir, store) = temp_store();
    let workflow = CaseWorkflow::default();
    let case = open(&workflow, "C-1");

    assert!(store.is_empty().unwrap());
    store.create(&case).unwrap();
    assert_eq!(store.len().unwrap(), 1);

    let loaded = store.load(&CaseId::new("C-1")).unwrap().unwrap();
    assert_eq!(loaded, case);
    assert!(store.load(&CaseId::new("C-2")).unwrap().is_none());
}

#[test]
fn test_create_rejects_duplicate() {
    let (_dir, store) = temp_store();
    let workflow = CaseWorkflow::default();
    let case = open(&workflow, "C-1");

    store.create(&case).unwrap();
    let err = store.create(&case).unwrap_err();
    assert!(matches!(err, LexflowError::DuplicateCase(id) if id.as_str() == "C-1"));
}

#[test]
fn test_require_missing_case() {
    let (_dir, store) = temp_store();
    let err = store.require(&CaseId::new("nope")).unwrap_err();
    assert!(matches!(err, LexflowError::CaseNotFound(_)));
}

#[test]
fn test_update_persists_result() {
    let (_dir, store) = temp_store();
    let workflow = CaseWorkflow::default();
    let holidays = HolidaySet::default();
    store.create(&open(&workflow, "C-1")).unwrap();

    let updated = store
        .update(&CaseId::new("C-1"), |state| {
            workflow.transition(state, Stage::Intake, "clerk", now(), None, &holidays)
        })
        .unwrap();
    assert_eq!(updated.current_stage, Stage::Intake);

    let reloaded = store.require(&CaseId::new("C-1")).unwrap();
    assert_eq!(reloaded.current_stage, Stage::Intake);
    assert_eq!(reloaded.stage_history.len(), 2);
}

#[test]
fn test_failed_update_writes_nothing() {
    let (_dir, store) = temp_store();
    let workflow = CaseWorkflow::default();
    let holidays = HolidaySet::default();
    let original = open(&workflow, "C-1");
    store.create(&original).unwrap();

    let err = store
        .update(&CaseId::new("C-1"), |state| {
            workflow.transition(state, Stage::Closed, "clerk", now(), None, &holidays)
        })
        .unwrap_err();
    assert!(matches!(err, LexflowError::InvalidTransition(_)));

    let err = store
        .update(&CaseId::new("C-1"), |state| {
            workflow.complete_deadline(state, DeadlineId(99), "clerk", now())
        })
        .unwrap_err();
    assert!(matches!(err, LexflowError::DeadlineNotFound(_)));

    assert_eq!(store.require(&CaseId::new("C-1")).unwrap(), original);
}

#[test]
fn test_update_missing_case() {
    let (_dir, store) = temp_store();
    let err = store
        .update(&CaseId::new("ghost"), |state| Ok(state.clone()))
        .unwrap_err();
    assert!(matches!(err, LexflowError::CaseNotFound(_)));
}

#[test]
fn test_list_is_ordered_by_id() {
    let (_dir, store) = temp_store();
    let workflow = CaseWorkflow::default();
    for id in ["C-3", "C-1", "C-2"] {
        store.create(&open(&workflow, id)).unwrap();
    }

    let ids: Vec<String> = store
        .list()
        .unwrap()
        .into_iter()
        .map(|c| c.case_id.0)
        .collect();
    assert_eq!(ids, vec!["C-1", "C-2", "C-3"]);
}

#[test]
fn test_reopen_keeps_cases() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cases.db");
    let workflow = CaseWorkflow::default();
    let case = open(&workflow, "C-1");

    {
        let store = CaseStore::open(&path).unwrap();
        store.save(&case).unwrap();
    }

    let store = CaseStore::open(&path).unwrap();
    assert_eq!(store.require(&CaseId::new("C-1")).unwrap(), case);
}
