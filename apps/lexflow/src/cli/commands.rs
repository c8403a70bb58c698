//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command that changes a case goes through [`CaseStore::update`], so
//! the engine result is either fully persisted or not at all.

use crate::api;
use crate::config::Runtime;
use crate::store::CaseStore;
use chrono::{DateTime, NaiveDate, Utc};
use lexflow_core::{
    CaseId, CaseWorkflowState, DeadlineId, LexflowError, NotificationChannel, PortfolioSummary,
    Stage, add_business_days, count_business_days, snapshot_crypto_hash, summarize,
};
use std::path::PathBuf;

// =============================================================================
// CONTEXT
// =============================================================================

/// Global options every command sees.
#[derive(Debug, Clone)]
pub struct Context {
    pub database: PathBuf,
    pub config: PathBuf,
    pub json_mode: bool,
    pub now: DateTime<Utc>,
}

impl Context {
    fn runtime(&self) -> Result<Runtime, LexflowError> {
        Runtime::load(&self.config)
    }

    /// Open the case database, which must already exist.
    fn store(&self) -> Result<CaseStore, LexflowError> {
        if !self.database.exists() {
            return Err(LexflowError::IoError(format!(
                "Database {} not found; run `lexflow init` first",
                self.database.display()
            )));
        }
        CaseStore::open(&self.database)
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), LexflowError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| LexflowError::SerializationError(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

/// Basis points as a percentage with two decimals.
fn percent(basis_points: u64) -> String {
    format!("{}.{:02}%", basis_points / 100, basis_points % 100)
}

fn print_case(ctx: &Context, state: &CaseWorkflowState) -> Result<(), LexflowError> {
    if ctx.json_mode {
        let output = serde_json::json!({
            "case": state,
            "blake3": snapshot_crypto_hash(state)?,
        });
        return print_json(&output);
    }

    println!("Case {}", state.case_id);
    println!("==========");
    println!("Stage: {}", state.current_stage);
    println!();
    println!("History:");
    for record in &state.stage_history {
        match &record.notes {
            Some(notes) => println!(
                "  {}  {:<30} by {} ({})",
                record.timestamp.to_rfc3339(),
                record.stage.as_str(),
                record.actor_id,
                notes
            ),
            None => println!(
                "  {}  {:<30} by {}",
                record.timestamp.to_rfc3339(),
                record.stage.as_str(),
                record.actor_id
            ),
        }
    }
    println!();
    println!("Deadlines:");
    if state.deadlines.is_empty() {
        println!("  (none)");
    }
    for d in &state.deadlines {
        println!(
            "  {:<5} {:<32} due {}  {:<9} {:>4} days  {:>3}%  [{}]",
            d.id.to_string(),
            d.kind.as_str(),
            d.end_date,
            d.status.as_str(),
            d.days_remaining,
            d.progress_percentage,
            d.priority.as_str()
        );
    }
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(ctx: &Context, host: &str, port: u16) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;

    println!("Lexflow Workflow Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:         {}", host);
    println!("  Port:         {}", port);
    println!("  Config:       {}", ctx.config.display());
    println!(
        "  Jurisdiction: {} (calendar {})",
        runtime.jurisdiction, runtime.calendar_version
    );
    println!("  Holidays:     {}", runtime.holidays.len());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, runtime).await
}

// =============================================================================
// DATABASE COMMANDS
// =============================================================================

/// Create an empty case database.
pub fn cmd_init(ctx: &Context, force: bool) -> Result<(), LexflowError> {
    if ctx.database.exists() {
        if !force {
            return Err(LexflowError::IoError(format!(
                "Database {} already exists; use --force to replace it",
                ctx.database.display()
            )));
        }
        std::fs::remove_file(&ctx.database).map_err(|e| {
            LexflowError::IoError(format!("Cannot remove {}: {}", ctx.database.display(), e))
        })?;
        tracing::warn!("Replaced existing database {}", ctx.database.display());
    }

    CaseStore::open(&ctx.database)?;
    tracing::info!("Initialized case database {}", ctx.database.display());

    if ctx.json_mode {
        return print_json(&serde_json::json!({
            "database": ctx.database.to_string_lossy(),
            "initialized": true,
        }));
    }
    println!("Initialized case database {}", ctx.database.display());
    Ok(())
}

// =============================================================================
// CASE COMMANDS
// =============================================================================

/// File a new case.
pub fn cmd_open(ctx: &Context, case: &str, actor: &str) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;

    let state = runtime
        .workflow
        .open_case(CaseId::new(case), actor, ctx.now, &runtime.holidays)?;
    store.create(&state)?;
    tracing::info!(case_id = %state.case_id, actor, "Case opened");

    print_case(ctx, &state)
}

/// Move a case to another stage.
pub fn cmd_transition(
    ctx: &Context,
    case: &str,
    to: &str,
    actor: &str,
    notes: Option<&str>,
) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;
    let target: Stage = to.parse()?;

    let state = store.update(&CaseId::new(case), |s| {
        runtime
            .workflow
            .transition(s, target, actor, ctx.now, notes, &runtime.holidays)
    })?;
    tracing::info!(case_id = case, to = target.as_str(), actor, "Stage transition");

    print_case(ctx, &state)
}

/// Show a case as of `now` without persisting the recomputation.
pub fn cmd_show(ctx: &Context, case: &str) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;

    let stored = store.require(&CaseId::new(case))?;
    let view = runtime
        .workflow
        .recompute_all(&stored, ctx.now, &runtime.holidays);
    print_case(ctx, &view)
}

/// Recompute and persist deadline statuses of one case or of all cases.
pub fn cmd_recompute(ctx: &Context, case: Option<&str>) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;
    let recompute = |s: &CaseWorkflowState| -> Result<CaseWorkflowState, LexflowError> {
        Ok(runtime
            .workflow
            .recompute_all(s, ctx.now, &runtime.holidays))
    };

    let updated = match case {
        Some(id) => vec![store.update(&CaseId::new(id), recompute)?],
        None => {
            let mut updated = Vec::new();
            for stored in store.list()? {
                updated.push(store.update(&stored.case_id, recompute)?);
            }
            updated
        }
    };
    tracing::info!(cases = updated.len(), now = %ctx.now, "Recomputed deadline statuses");

    if ctx.json_mode {
        let ids: Vec<&str> = updated.iter().map(|s| s.case_id.as_str()).collect();
        return print_json(&serde_json::json!({ "recomputed": ids, "now": ctx.now }));
    }
    println!("Recomputed {} case(s) as of {}", updated.len(), ctx.now.to_rfc3339());
    Ok(())
}

// =============================================================================
// DEADLINE COMMANDS
// =============================================================================

pub fn cmd_complete(ctx: &Context, case: &str, deadline: u64, by: &str) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;
    let state = store.update(&CaseId::new(case), |s| {
        runtime
            .workflow
            .complete_deadline(s, DeadlineId(deadline), by, ctx.now)
    })?;
    tracing::info!(case_id = case, deadline, by, "Deadline completed");
    print_case(ctx, &state)
}

pub fn cmd_extend(
    ctx: &Context,
    case: &str,
    deadline: u64,
    days: i64,
    reason: &str,
    approved_by: &str,
) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;
    let state = store.update(&CaseId::new(case), |s| {
        runtime.workflow.extend_deadline(
            s,
            DeadlineId(deadline),
            days,
            reason,
            approved_by,
            ctx.now,
            &runtime.holidays,
        )
    })?;
    tracing::info!(case_id = case, deadline, days, approved_by, "Deadline extended");
    print_case(ctx, &state)
}

pub fn cmd_progress(
    ctx: &Context,
    case: &str,
    deadline: u64,
    percent: i64,
) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;
    let state = store.update(&CaseId::new(case), |s| {
        runtime
            .workflow
            .update_progress(s, DeadlineId(deadline), percent)
    })?;
    print_case(ctx, &state)
}

pub fn cmd_notify(
    ctx: &Context,
    case: &str,
    deadline: u64,
    recipient: &str,
    channel: &str,
) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;
    let channel: NotificationChannel = channel.parse()?;
    let state = store.update(&CaseId::new(case), |s| {
        runtime
            .workflow
            .record_notification(s, DeadlineId(deadline), recipient, channel, ctx.now)
    })?;
    print_case(ctx, &state)
}

pub fn cmd_note(ctx: &Context, case: &str, deadline: u64, text: &str) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;
    let state = store.update(&CaseId::new(case), |s| {
        runtime.workflow.set_notes(s, DeadlineId(deadline), text)
    })?;
    print_case(ctx, &state)
}

// =============================================================================
// REPORT COMMAND
// =============================================================================

/// Portfolio summary over every stored case, as of `now`.
pub fn cmd_report(ctx: &Context) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let store = ctx.store()?;

    let cases: Vec<CaseWorkflowState> = store
        .list()?
        .iter()
        .map(|s| runtime.workflow.recompute_all(s, ctx.now, &runtime.holidays))
        .collect();
    let summary = summarize(&cases);

    if ctx.json_mode {
        return print_json(&summary);
    }
    print_summary(ctx, &summary);
    Ok(())
}

fn print_summary(ctx: &Context, summary: &PortfolioSummary) {
    println!("Lexflow Portfolio Report");
    println!("========================");
    println!("As of:    {}", ctx.now.to_rfc3339());
    println!("Database: {}", ctx.database.display());
    println!();
    println!("Cases: {}", summary.cases);
    for (stage, count) in &summary.cases_by_stage {
        println!("  {:<32} {}", stage.as_str(), count);
    }
    println!();
    println!("Deadlines:  {}", summary.total);
    println!("  On track:  {}", summary.on_track);
    println!("  Warning:   {}", summary.warning);
    println!("  Critical:  {}", summary.critical);
    println!("  Expired:   {}", summary.expired);
    println!("  Completed: {}", summary.completed);
    println!("With extensions: {}", summary.with_extensions);
    println!();
    println!("Completion rate: {}", percent(summary.completion_rate));
    println!("Compliance rate: {}", percent(summary.compliance_rate));
    println!();
    match &summary.next_critical_deadline {
        Some(next) => println!(
            "Next critical: {} {} ({}) due {}, {} business days",
            next.case_id, next.deadline_id, next.name, next.end_date, next.days_remaining
        ),
        None => println!("Next critical: none"),
    }
}

// =============================================================================
// REFERENCE COMMANDS
// =============================================================================

/// List stages and permitted transitions.
pub fn cmd_stages(ctx: &Context) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let table = runtime.workflow.table();

    if ctx.json_mode {
        return print_json(&api::StagesResponse::from_table(table));
    }

    println!("Lexflow Procedure Stages");
    println!("========================");
    for stage in Stage::ALL {
        let successors: Vec<&str> = table.successors(stage).map(|s| s.as_str()).collect();
        let successors = if successors.is_empty() {
            "-".to_string()
        } else {
            successors.join(", ")
        };
        println!("  {:<32} -> {}", stage.as_str(), successors);
    }
    println!();
    println!("{} permitted transitions", table.edge_count());
    Ok(())
}

pub fn cmd_business_days_add(ctx: &Context, from: NaiveDate, days: i64) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let due = add_business_days(from, days, &runtime.holidays)?;

    if ctx.json_mode {
        return print_json(&serde_json::json!({ "from": from, "days": days, "date": due }));
    }
    println!("{} + {} business days = {}", from, days, due);
    Ok(())
}

pub fn cmd_business_days_count(
    ctx: &Context,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<(), LexflowError> {
    let runtime = ctx.runtime()?;
    let count = count_business_days(from, to, &runtime.holidays);

    if ctx.json_mode {
        return print_json(&serde_json::json!({ "from": from, "to": to, "business_days": count }));
    }
    println!("{} business days from {} to {}", count, from, to);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_formats_basis_points() {
        assert_eq!(percent(0), "0.00%");
        assert_eq!(percent(3_333), "33.33%");
        assert_eq!(percent(10_000), "100.00%");
    }
}
