//! Integration tests for the Lexflow HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use lexflow::api::{
    AppState, CalendarResponse, CaseResponse, HealthResponse, PortfolioResponse, StagesResponse,
    create_router,
};
use lexflow::config::{LexflowConfig, Runtime};
use lexflow_core::{CaseWorkflowState, DeadlineStatus, Stage};
use serde_json::json;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

const NOW: &str = "2025-03-03T09:00:00Z";

/// Create a test server whose calendar has 2025-03-10 as a holiday.
fn create_test_server() -> TestServer {
    let runtime: Runtime = LexflowConfig::from_toml_str(
        "[calendar]\njurisdiction = \"TEST\"\nversion = \"1\"\n\n[calendar.years]\n2025 = [\"2025-03-10\"]\n",
    )
    .unwrap()
    .into_runtime()
    .unwrap();
    TestServer::new(create_router(AppState::new(runtime))).unwrap()
}

async fn open_case(server: &TestServer, case_id: &str) -> CaseWorkflowState {
    let response = server
        .post("/cases/open")
        .json(&json!({ "case_id": case_id, "actor_id": "clerk", "now": NOW }))
        .await;
    response.assert_status_ok();
    let body: CaseResponse = response.json();
    body.case.unwrap()
}

// =============================================================================
// HEALTH / STAGES
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();
    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_stages_endpoint() {
    let server = create_test_server();
    let response = server.get("/stages").await;

    response.assert_status_ok();
    let stages: StagesResponse = response.json();
    assert_eq!(stages.stages.len(), 18);

    let filed = stages
        .stages
        .iter()
        .find(|s| s.stage == Stage::Filed)
        .unwrap();
    assert_eq!(
        filed.successors,
        vec![Stage::Intake, Stage::Abandoned, Stage::DerivedToExternalAuthority]
    );
    let closed = stages.stages.iter().find(|s| s.stage == Stage::Closed).unwrap();
    assert!(closed.is_terminal);
    assert!(closed.successors.is_empty());
}

// =============================================================================
// CALENDAR
// =============================================================================

#[tokio::test]
async fn test_calendar_add_skips_configured_holiday() {
    let server = create_test_server();
    let response = server
        .post("/calendar/add")
        .json(&json!({ "date": "2025-03-07", "days": 3 }))
        .await;

    response.assert_status_ok();
    let body: CalendarResponse = response.json();
    assert_eq!(body.date.unwrap().to_string(), "2025-03-13");
}

#[tokio::test]
async fn test_calendar_add_calendar_policy() {
    let server = create_test_server();
    let response = server
        .post("/calendar/add")
        .json(&json!({ "date": "2025-03-07", "days": 3, "policy": "calendar" }))
        .await;

    let body: CalendarResponse = response.json();
    assert_eq!(body.date.unwrap().to_string(), "2025-03-10");
}

#[tokio::test]
async fn test_calendar_add_negative_is_unprocessable() {
    let server = create_test_server();
    let response = server
        .post("/calendar/add")
        .json(&json!({ "date": "2025-03-07", "days": -1 }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: CalendarResponse = response.json();
    assert!(!body.success);
    assert!(body.error.is_some());
}

#[tokio::test]
async fn test_calendar_add_oversized_is_unprocessable() {
    let server = create_test_server();
    for policy in ["business", "calendar"] {
        let response = server
            .post("/calendar/add")
            .json(&json!({ "date": "2025-03-07", "days": i64::MAX, "policy": policy }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: CalendarResponse = response.json();
        assert!(body.error.unwrap().contains("Day count"));
    }
}

#[tokio::test]
async fn test_calendar_count_over_wide_span() {
    let server = create_test_server();
    let response = server
        .post("/calendar/count")
        .json(&json!({ "start": "0001-01-01", "end": "9999-12-31" }))
        .await;

    response.assert_status_ok();
    let body: CalendarResponse = response.json();
    assert!(body.business_days.unwrap() > 2_000_000);
}

#[tokio::test]
async fn test_calendar_count() {
    let server = create_test_server();
    let response = server
        .post("/calendar/count")
        .json(&json!({ "start": "2025-03-07", "end": "2025-03-14" }))
        .await;

    response.assert_status_ok();
    let body: CalendarResponse = response.json();
    // Fri 7, (Mon 10 holiday), Tue 11 .. Fri 14.
    assert_eq!(body.business_days, Some(5));
}

// =============================================================================
// CASES
// =============================================================================

#[tokio::test]
async fn test_open_case() {
    let server = create_test_server();
    let case = open_case(&server, "C-1").await;

    assert_eq!(case.current_stage, Stage::Filed);
    assert_eq!(case.deadlines.len(), 1);
    // Mon 3 + 3 business days.
    assert_eq!(case.deadlines[0].end_date.to_string(), "2025-03-06");
}

#[tokio::test]
async fn test_transition_and_illegal_transition() {
    let server = create_test_server();
    let case = open_case(&server, "C-2").await;

    let response = server
        .post("/cases/transition")
        .json(&json!({
            "case": case,
            "target": "intake",
            "actor_id": "clerk",
            "notes": "admitted",
            "now": NOW
        }))
        .await;
    response.assert_status_ok();
    let moved: CaseResponse = response.json();
    let moved = moved.case.unwrap();
    assert_eq!(moved.current_stage, Stage::Intake);

    let response = server
        .post("/cases/transition")
        .json(&json!({ "case": moved, "target": "closed", "actor_id": "clerk", "now": NOW }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let refused: CaseResponse = response.json();
    assert!(!refused.success);
    assert!(refused.case.is_none());
    assert!(refused.error.unwrap().contains("intake cannot move to closed"));
}

#[tokio::test]
async fn test_recompute_expires_overdue_deadline() {
    let server = create_test_server();
    let case = open_case(&server, "C-3").await;

    let response = server
        .post("/cases/recompute")
        .json(&json!({ "case": case, "now": "2025-03-12T09:00:00Z" }))
        .await;
    response.assert_status_ok();
    let body: CaseResponse = response.json();
    let deadline = &body.case.unwrap().deadlines[0];
    assert_eq!(deadline.status, DeadlineStatus::Expired);
    assert!(deadline.days_remaining < 0);
}

// =============================================================================
// DEADLINES
// =============================================================================

#[tokio::test]
async fn test_deadline_operations() {
    let server = create_test_server();
    let case = open_case(&server, "C-4").await;

    let response = server
        .post("/deadlines/progress")
        .json(&json!({ "case": case, "deadline_id": 1, "percentage": 250 }))
        .await;
    response.assert_status_ok();
    let case = response.json::<CaseResponse>().case.unwrap();
    assert_eq!(case.deadlines[0].progress_percentage, 100);

    let response = server
        .post("/deadlines/notify")
        .json(&json!({
            "case": case,
            "deadline_id": 1,
            "recipient": "hr@example.org",
            "channel": "email",
            "now": NOW
        }))
        .await;
    response.assert_status_ok();
    let case = response.json::<CaseResponse>().case.unwrap();
    assert_eq!(case.deadlines[0].notifications_sent.len(), 1);

    let response = server
        .post("/deadlines/notes")
        .json(&json!({ "case": case, "deadline_id": 1, "notes": "sent by courier" }))
        .await;
    response.assert_status_ok();
    let case = response.json::<CaseResponse>().case.unwrap();
    assert_eq!(case.deadlines[0].notes, "sent by courier");

    let response = server
        .post("/deadlines/extend")
        .json(&json!({
            "case": case,
            "deadline_id": 1,
            "additional_days": 2,
            "reason": "regulator closed",
            "approved_by": "director",
            "now": NOW
        }))
        .await;
    response.assert_status_ok();
    let case = response.json::<CaseResponse>().case.unwrap();
    // Thu 6 + 2 business days, Mon 10 is a holiday.
    assert_eq!(case.deadlines[0].end_date.to_string(), "2025-03-11");
    assert_eq!(case.deadlines[0].status, DeadlineStatus::Extended);

    let response = server
        .post("/deadlines/complete")
        .json(&json!({ "case": case, "deadline_id": 1, "completed_by": "clerk", "now": NOW }))
        .await;
    response.assert_status_ok();
    let case = response.json::<CaseResponse>().case.unwrap();
    assert_eq!(case.deadlines[0].status, DeadlineStatus::Completed);

    let response = server
        .post("/deadlines/complete")
        .json(&json!({ "case": case, "deadline_id": 1, "completed_by": "clerk", "now": NOW }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unknown_deadline_is_not_found() {
    let server = create_test_server();
    let case = open_case(&server, "C-5").await;

    let response = server
        .post("/deadlines/progress")
        .json(&json!({ "case": case, "deadline_id": 42, "percentage": 10 }))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_positive_extension_is_unprocessable() {
    let server = create_test_server();
    let case = open_case(&server, "C-6").await;

    let response = server
        .post("/deadlines/extend")
        .json(&json!({
            "case": case,
            "deadline_id": 1,
            "additional_days": 0,
            "reason": "none",
            "approved_by": "director"
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// PORTFOLIO
// =============================================================================

#[tokio::test]
async fn test_portfolio_summary() {
    let server = create_test_server();
    let first = open_case(&server, "C-7").await;
    let second = open_case(&server, "C-8").await;

    let response = server
        .post("/portfolio/summary")
        .json(&json!({ "cases": [first, second], "now": "2025-03-05T09:00:00Z" }))
        .await;
    response.assert_status_ok();
    let body: PortfolioResponse = response.json();
    let summary = body.summary.unwrap();

    assert_eq!(summary.cases, 2);
    assert_eq!(summary.total, 2);
    // Due Thu 6, asked Wed 5: two business days left.
    assert_eq!(summary.warning, 2);
    assert_eq!(summary.compliance_rate, 0);
    let next = summary.next_critical_deadline.unwrap();
    assert_eq!(next.case_id.as_str(), "C-7");
}

#[tokio::test]
async fn test_portfolio_summary_empty() {
    let server = create_test_server();
    let response = server
        .post("/portfolio/summary")
        .json(&json!({ "cases": [] }))
        .await;
    response.assert_status_ok();
    let summary = response.json::<PortfolioResponse>().summary.unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(summary.completion_rate, 0);
}
