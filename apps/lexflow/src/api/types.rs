//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! The API is stateless: every request carries the case snapshot it operates
//! on and gets the updated snapshot back. `now` defaults to the server clock
//! when omitted.

use chrono::{DateTime, NaiveDate, Utc};
use lexflow_core::{
    CaseId, CaseWorkflowState, DayCountPolicy, DeadlineId, NotificationChannel, PortfolioSummary,
    Stage, TransitionTable,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STAGES RESPONSE
// =============================================================================

/// One stage and its permitted successors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageJson {
    pub stage: Stage,
    pub name: String,
    pub is_branch: bool,
    pub is_short_circuit: bool,
    pub is_terminal: bool,
    pub successors: Vec<Stage>,
}

/// The procedure's stages and adjacency table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesResponse {
    pub stages: Vec<StageJson>,
    pub transition_count: usize,
}

impl StagesResponse {
    #[must_use]
    pub fn from_table(table: &TransitionTable) -> Self {
        let stages = Stage::ALL
            .iter()
            .map(|stage| StageJson {
                stage: *stage,
                name: stage.name().to_string(),
                is_branch: stage.is_branch(),
                is_short_circuit: stage.is_short_circuit(),
                is_terminal: stage.is_terminal(),
                successors: table.successors(*stage).collect(),
            })
            .collect();
        Self {
            stages,
            transition_count: table.edge_count(),
        }
    }
}

// =============================================================================
// CALENDAR REQUEST/RESPONSE
// =============================================================================

/// Advance a date by a day count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarAddRequest {
    pub date: NaiveDate,
    pub days: i64,
    #[serde(default = "default_policy")]
    pub policy: DayCountPolicy,
}

fn default_policy() -> DayCountPolicy {
    DayCountPolicy::Business
}

/// Count business days between two dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarCountRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Calendar operation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub business_days: Option<i64>,
    pub error: Option<String>,
}

impl CalendarResponse {
    pub fn with_date(date: NaiveDate) -> Self {
        Self {
            success: true,
            date: Some(date),
            business_days: None,
            error: None,
        }
    }

    pub fn with_count(count: i64) -> Self {
        Self {
            success: true,
            date: None,
            business_days: Some(count),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            date: None,
            business_days: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CASE REQUESTS
// =============================================================================

/// File a new case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenCaseRequest {
    pub case_id: CaseId,
    pub actor_id: String,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

/// Move a case to another stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRequest {
    pub case: CaseWorkflowState,
    pub target: Stage,
    pub actor_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

/// Recompute every deadline of a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecomputeRequest {
    pub case: CaseWorkflowState,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

// =============================================================================
// DEADLINE REQUESTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteRequest {
    pub case: CaseWorkflowState,
    pub deadline_id: DeadlineId,
    pub completed_by: String,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendRequest {
    pub case: CaseWorkflowState,
    pub deadline_id: DeadlineId,
    pub additional_days: i64,
    pub reason: String,
    pub approved_by: String,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressRequest {
    pub case: CaseWorkflowState,
    pub deadline_id: DeadlineId,
    pub percentage: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyRequest {
    pub case: CaseWorkflowState,
    pub deadline_id: DeadlineId,
    pub recipient: String,
    pub channel: NotificationChannel,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesRequest {
    pub case: CaseWorkflowState,
    pub deadline_id: DeadlineId,
    pub notes: String,
}

// =============================================================================
// CASE RESPONSE
// =============================================================================

/// Updated case snapshot, or the reason the operation was refused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResponse {
    pub success: bool,
    pub case: Option<CaseWorkflowState>,
    pub error: Option<String>,
}

impl CaseResponse {
    pub fn success(case: CaseWorkflowState) -> Self {
        Self {
            success: true,
            case: Some(case),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            case: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// PORTFOLIO REQUEST/RESPONSE
// =============================================================================

/// Summarize a set of cases.
///
/// With `now`, every case is recomputed before counting; without it the
/// stored statuses are counted as they are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioRequest {
    pub cases: Vec<CaseWorkflowState>,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResponse {
    pub success: bool,
    pub summary: Option<PortfolioSummary>,
    pub error: Option<String>,
}

impl PortfolioResponse {
    pub fn success(summary: PortfolioSummary) -> Self {
        Self {
            success: true,
            summary: Some(summary),
            error: None,
        }
    }
}
