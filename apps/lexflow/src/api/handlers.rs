//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        CalendarAddRequest, CalendarCountRequest, CalendarResponse, CaseResponse, CompleteRequest,
        ExtendRequest, HealthResponse, NotesRequest, NotifyRequest, OpenCaseRequest,
        PortfolioRequest, PortfolioResponse, ProgressRequest, RecomputeRequest, StagesResponse,
        TransitionRequest,
    },
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use lexflow_core::{
    CaseWorkflowState, LexflowError, calendar, count_business_days, summarize,
};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP status for an engine error.
#[must_use]
pub fn error_status(error: &LexflowError) -> StatusCode {
    match error {
        LexflowError::InvalidTransition(_) | LexflowError::DuplicateCase(_) => {
            StatusCode::CONFLICT
        }
        LexflowError::DeadlineNotFound(_) | LexflowError::CaseNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        LexflowError::InvalidTemplate(_) | LexflowError::OutOfRangeInput(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LexflowError::SerializationError(_) => StatusCode::BAD_REQUEST,
        LexflowError::ConfigError(_) | LexflowError::IoError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn case_result(
    operation: &str,
    result: Result<CaseWorkflowState, LexflowError>,
) -> (StatusCode, Json<CaseResponse>) {
    match result {
        Ok(case) => {
            tracing::debug!(case_id = %case.case_id, stage = case.current_stage.as_str(), "{} ok", operation);
            (StatusCode::OK, Json(CaseResponse::success(case)))
        }
        Err(e) => {
            tracing::warn!("{} refused: {}", operation, e);
            (error_status(&e), Json(CaseResponse::error(e.to_string())))
        }
    }
}

// =============================================================================
// HEALTH / STAGES HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// List stages with their permitted successors.
pub async fn stages_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(StagesResponse::from_table(state.workflow.table())),
    )
}

// =============================================================================
// CALENDAR HANDLERS
// =============================================================================

/// Advance a date by business or calendar days.
pub async fn calendar_add_handler(
    State(state): State<AppState>,
    Json(request): Json<CalendarAddRequest>,
) -> impl IntoResponse {
    match calendar::advance(request.date, request.days, request.policy, &state.holidays) {
        Ok(date) => (StatusCode::OK, Json(CalendarResponse::with_date(date))),
        Err(e) => (error_status(&e), Json(CalendarResponse::error(e.to_string()))),
    }
}

/// Signed business-day count between two dates.
pub async fn calendar_count_handler(
    State(state): State<AppState>,
    Json(request): Json<CalendarCountRequest>,
) -> impl IntoResponse {
    let count = count_business_days(request.start, request.end, &state.holidays);
    (StatusCode::OK, Json(CalendarResponse::with_count(count)))
}

// =============================================================================
// CASE HANDLERS
// =============================================================================

/// File a new case.
pub async fn open_case_handler(
    State(state): State<AppState>,
    Json(request): Json<OpenCaseRequest>,
) -> impl IntoResponse {
    let now = request.now.unwrap_or_else(Utc::now);
    let result =
        state
            .workflow
            .open_case(request.case_id, &request.actor_id, now, &state.holidays);
    case_result("open", result)
}

/// Move a case to another stage.
pub async fn transition_handler(
    State(state): State<AppState>,
    Json(request): Json<TransitionRequest>,
) -> impl IntoResponse {
    let now = request.now.unwrap_or_else(Utc::now);
    let result = state.workflow.transition(
        &request.case,
        request.target,
        &request.actor_id,
        now,
        request.notes.as_deref(),
        &state.holidays,
    );
    if result.is_ok() {
        tracing::info!(
            case_id = %request.case.case_id,
            from = request.case.current_stage.as_str(),
            to = request.target.as_str(),
            "Stage transition"
        );
    }
    case_result("transition", result)
}

/// Recompute every deadline of a case.
pub async fn recompute_handler(
    State(state): State<AppState>,
    Json(request): Json<RecomputeRequest>,
) -> impl IntoResponse {
    let now = request.now.unwrap_or_else(Utc::now);
    let case = state
        .workflow
        .recompute_all(&request.case, now, &state.holidays);
    case_result("recompute", Ok(case))
}

// =============================================================================
// DEADLINE HANDLERS
// =============================================================================

pub async fn complete_handler(
    State(state): State<AppState>,
    Json(request): Json<CompleteRequest>,
) -> impl IntoResponse {
    let now = request.now.unwrap_or_else(Utc::now);
    let result = state.workflow.complete_deadline(
        &request.case,
        request.deadline_id,
        &request.completed_by,
        now,
    );
    case_result("complete", result)
}

pub async fn extend_handler(
    State(state): State<AppState>,
    Json(request): Json<ExtendRequest>,
) -> impl IntoResponse {
    let now = request.now.unwrap_or_else(Utc::now);
    let result = state.workflow.extend_deadline(
        &request.case,
        request.deadline_id,
        request.additional_days,
        &request.reason,
        &request.approved_by,
        now,
        &state.holidays,
    );
    case_result("extend", result)
}

pub async fn progress_handler(
    State(state): State<AppState>,
    Json(request): Json<ProgressRequest>,
) -> impl IntoResponse {
    let result =
        state
            .workflow
            .update_progress(&request.case, request.deadline_id, request.percentage);
    case_result("progress", result)
}

pub async fn notify_handler(
    State(state): State<AppState>,
    Json(request): Json<NotifyRequest>,
) -> impl IntoResponse {
    let now = request.now.unwrap_or_else(Utc::now);
    let result = state.workflow.record_notification(
        &request.case,
        request.deadline_id,
        &request.recipient,
        request.channel,
        now,
    );
    case_result("notify", result)
}

pub async fn notes_handler(
    State(state): State<AppState>,
    Json(request): Json<NotesRequest>,
) -> impl IntoResponse {
    let result = state
        .workflow
        .set_notes(&request.case, request.deadline_id, &request.notes);
    case_result("notes", result)
}

// =============================================================================
// PORTFOLIO HANDLER
// =============================================================================

/// Summarize deadline statuses over the submitted cases.
pub async fn portfolio_handler(
    State(state): State<AppState>,
    Json(request): Json<PortfolioRequest>,
) -> impl IntoResponse {
    let summary = match request.now {
        Some(now) => {
            let recomputed: Vec<CaseWorkflowState> = request
                .cases
                .iter()
                .map(|case| state.workflow.recompute_all(case, now, &state.holidays))
                .collect();
            summarize(&recomputed)
        }
        None => summarize(&request.cases),
    };
    (StatusCode::OK, Json(PortfolioResponse::success(summary)))
}
