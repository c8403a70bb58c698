//! # Deadline Engine
//!
//! Lifecycle of a single legal deadline: initialization from a template,
//! status recomputation against an explicit "now", completion, extension,
//! progress and the notification log.
//!
//! ## Status Machine
//!
//! ```text
//! on_track -> warning -> critical -> expired
//!     \          |          |          /
//!      +---------+----------+---------+---> completed   (terminal)
//!      +---------+----------+---------+---> extended    (reclassified on next recompute)
//! ```
//!
//! Every operation takes the deadline by reference and returns a new value.
//! The engine never reads the clock and never logs.

use crate::calendar::{self, HolidaySet};
use crate::primitives::{
    DEFAULT_CRITICAL_DAYS, DEFAULT_WARNING_DAYS, MAX_DAY_COUNT, MAX_PROGRESS,
};
use crate::system::Stage;
use crate::template::DeadlineTemplate;
use crate::{
    DayCountPolicy, DeadlineId, DeadlineKind, DeadlineStatus, LexflowError, NotificationChannel,
    Priority,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// DEADLINE
// =============================================================================

/// One entry of the append-only notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub date: DateTime<Utc>,
    pub recipient: String,
    pub channel: NotificationChannel,
}

/// Audit record of a granted extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    pub previous_end_date: NaiveDate,
    pub new_end_date: NaiveDate,
    pub additional_days: u32,
    pub reason: String,
    pub approved_by: String,
    pub granted_at: DateTime<Utc>,
}

/// Who closed a deadline, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub completed_by: String,
    pub completed_date: DateTime<Utc>,
}

/// A tracked legal or operational time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: DeadlineId,
    pub kind: DeadlineKind,
    pub name: String,
    pub description: String,
    /// When the clock started.
    pub start_date: DateTime<Utc>,
    /// Due date, inclusive. Changes only through extension.
    pub end_date: NaiveDate,
    /// Due date before the first extension.
    pub original_end_date: Option<NaiveDate>,
    pub business_days_allotted: u32,
    pub day_count: DayCountPolicy,
    pub status: DeadlineStatus,
    /// Signed business days until `end_date`; negative once overdue.
    pub days_remaining: i64,
    pub is_legal_requirement: bool,
    pub legal_reference: Option<String>,
    pub associated_stage: Stage,
    pub priority: Priority,
    pub progress_percentage: u8,
    pub notifications_sent: Vec<NotificationEntry>,
    pub extensions: Vec<ExtensionRecord>,
    pub completion: Option<CompletionRecord>,
    pub notes: String,
}

impl Deadline {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == DeadlineStatus::Completed
    }

    #[must_use]
    pub fn is_overdue(&self) -> bool {
        self.status == DeadlineStatus::Expired
    }

    /// Neither completed nor expired.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    #[must_use]
    pub fn was_extended(&self) -> bool {
        self.original_end_date.is_some()
    }
}

// =============================================================================
// THRESHOLDS
// =============================================================================

/// Classification thresholds in business days remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusThresholds {
    /// At or below this many days a deadline is `critical`.
    pub critical_at: i64,
    /// At or below this many days a deadline is `warning`.
    pub warning_at: i64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            critical_at: DEFAULT_CRITICAL_DAYS,
            warning_at: DEFAULT_WARNING_DAYS,
        }
    }
}

impl StatusThresholds {
    /// Create thresholds, requiring `critical_at <= warning_at`.
    pub fn new(critical_at: i64, warning_at: i64) -> Result<Self, LexflowError> {
        if critical_at > warning_at {
            return Err(LexflowError::OutOfRangeInput(format!(
                "critical threshold {} exceeds warning threshold {}",
                critical_at, warning_at
            )));
        }
        Ok(Self {
            critical_at,
            warning_at,
        })
    }

    /// Status for a deadline that is not yet past due.
    #[must_use]
    pub fn classify(&self, days_remaining: i64) -> DeadlineStatus {
        if days_remaining <= self.critical_at {
            DeadlineStatus::Critical
        } else if days_remaining <= self.warning_at {
            DeadlineStatus::Warning
        } else {
            DeadlineStatus::OnTrack
        }
    }
}

// =============================================================================
// DEADLINE ENGINE
// =============================================================================

/// Deadline Engine - pure operations on a single deadline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadlineEngine {
    thresholds: StatusThresholds,
}

impl DeadlineEngine {
    /// Create an engine with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with custom thresholds.
    #[must_use]
    pub fn with_thresholds(thresholds: StatusThresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> StatusThresholds {
        self.thresholds
    }

    /// Start a deadline from a template.
    ///
    /// The due date is `start_date` advanced by the template's day count
    /// under its own day-count policy. The new deadline is `on_track`; the
    /// next recomputation classifies it.
    pub fn initialize(
        &self,
        template: &DeadlineTemplate,
        id: DeadlineId,
        start_date: DateTime<Utc>,
        holidays: &HolidaySet,
    ) -> Result<Deadline, LexflowError> {
        template.validate()?;

        let start_day = start_date.date_naive();
        let end_date = calendar::advance(
            start_day,
            i64::from(template.days),
            template.day_count,
            holidays,
        )?;

        Ok(Deadline {
            id,
            kind: template.kind,
            name: template.name.clone(),
            description: template.description.clone(),
            start_date,
            end_date,
            original_end_date: None,
            business_days_allotted: template.days,
            day_count: template.day_count,
            status: DeadlineStatus::OnTrack,
            days_remaining: calendar::count_business_days(start_day, end_date, holidays),
            is_legal_requirement: template.is_legal_requirement,
            legal_reference: template.legal_reference.clone(),
            associated_stage: template.stage,
            priority: template.priority,
            progress_percentage: 0,
            notifications_sent: Vec::new(),
            extensions: Vec::new(),
            completion: None,
            notes: String::new(),
        })
    }

    /// Reclassify a deadline against `now`.
    ///
    /// - `completed`: returned unchanged.
    /// - past due: `expired`, with an overdue count of at least one day.
    /// - `expired` stays `expired`; only its overdue count is refreshed.
    /// - otherwise classified by the thresholds.
    #[must_use]
    pub fn recompute_status(
        &self,
        deadline: &Deadline,
        now: DateTime<Utc>,
        holidays: &HolidaySet,
    ) -> Deadline {
        let mut next = deadline.clone();
        if next.is_completed() {
            return next;
        }

        let today = now.date_naive();
        let remaining = calendar::count_business_days(today, next.end_date, holidays);

        if today > next.end_date || next.status == DeadlineStatus::Expired {
            next.status = DeadlineStatus::Expired;
            next.days_remaining = remaining.min(-1);
        } else {
            next.status = self.thresholds.classify(remaining);
            next.days_remaining = remaining;
        }
        next
    }

    /// Close a deadline.
    pub fn complete(
        &self,
        deadline: &Deadline,
        completed_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Deadline, LexflowError> {
        if deadline.is_completed() {
            return Err(LexflowError::deadline_completed(deadline.id));
        }

        let mut next = deadline.clone();
        next.status = DeadlineStatus::Completed;
        next.progress_percentage = MAX_PROGRESS;
        next.completion = Some(CompletionRecord {
            completed_by: completed_by.to_string(),
            completed_date: now,
        });
        Ok(next)
    }

    /// Push the due date out by `additional_days` under the deadline's own
    /// day-count policy.
    ///
    /// The first extension preserves the original due date; later ones never
    /// overwrite it.
    pub fn extend(
        &self,
        deadline: &Deadline,
        additional_days: i64,
        reason: &str,
        approved_by: &str,
        now: DateTime<Utc>,
        holidays: &HolidaySet,
    ) -> Result<Deadline, LexflowError> {
        if deadline.is_completed() {
            return Err(LexflowError::deadline_completed(deadline.id));
        }
        if additional_days <= 0 || additional_days > MAX_DAY_COUNT {
            return Err(LexflowError::OutOfRangeInput(format!(
                "extension must be between 1 and {} days, got {}",
                MAX_DAY_COUNT, additional_days
            )));
        }

        let new_end =
            calendar::advance(deadline.end_date, additional_days, deadline.day_count, holidays)?;

        let mut next = deadline.clone();
        next.original_end_date.get_or_insert(deadline.end_date);
        next.end_date = new_end;
        next.status = DeadlineStatus::Extended;
        next.days_remaining = calendar::count_business_days(now.date_naive(), new_end, holidays);
        next.extensions.push(ExtensionRecord {
            previous_end_date: deadline.end_date,
            new_end_date: new_end,
            additional_days: additional_days as u32,
            reason: reason.to_string(),
            approved_by: approved_by.to_string(),
            granted_at: now,
        });
        Ok(next)
    }

    /// Set progress, clamped to `[0, 100]`. Status is not touched.
    #[must_use]
    pub fn update_progress(&self, deadline: &Deadline, percentage: i64) -> Deadline {
        let mut next = deadline.clone();
        next.progress_percentage = percentage.clamp(0, i64::from(MAX_PROGRESS)) as u8;
        next
    }

    /// Append a notification to the log.
    #[must_use]
    pub fn record_notification(
        &self,
        deadline: &Deadline,
        recipient: &str,
        channel: NotificationChannel,
        now: DateTime<Utc>,
    ) -> Deadline {
        let mut next = deadline.clone();
        next.notifications_sent.push(NotificationEntry {
            date: now,
            recipient: recipient.to_string(),
            channel,
        });
        next
    }

    /// Replace the free-text notes (last write wins).
    #[must_use]
    pub fn set_notes(&self, deadline: &Deadline, notes: &str) -> Deadline {
        let mut next = deadline.clone();
        next.notes = notes.to_string();
        next
    }
}

// =============================================================================
// TESTS
// =============================================================================
