//! # Configuration
//!
//! `lexflow.toml` holds everything that varies per deployment:
//!
//! ```toml
//! [calendar]
//! jurisdiction = "CL"
//! version = "2025.1"
//!
//! [calendar.years]
//! 2025 = ["2025-01-01", "2025-05-01"]
//!
//! [thresholds]
//! critical_at = 1
//! warning_at = 3
//!
//! [[templates]]
//! kind = "interviews_completion"
//! name = "Interviews"
//! days = 7
//! day_count = "business"
//! stage = "interviews"
//!
//! [transitions]
//! interviews = ["investigation_report", "abandoned"]
//! ```
//!
//! Holiday dates must be quoted strings. A missing file is not an error: the
//! engine runs on the statutory defaults with weekends as the only
//! non-business days.

use chrono::{Datelike, NaiveDate};
use lexflow_core::primitives::{DEFAULT_CRITICAL_DAYS, DEFAULT_WARNING_DAYS};
use lexflow_core::{
    CaseWorkflow, DeadlineEngine, HolidaySet, LexflowError, Stage, StatusThresholds,
    TemplateCatalog, TemplateSpec, TransitionTable,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "lexflow.toml";

// =============================================================================
// FILE LAYOUT
// =============================================================================

/// Versioned holiday table of one jurisdiction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub jurisdiction: String,
    pub version: String,
    /// Year (as written in TOML) to that year's holidays.
    pub years: BTreeMap<String, Vec<NaiveDate>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsConfig {
    pub critical_at: i64,
    pub warning_at: i64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            critical_at: DEFAULT_CRITICAL_DAYS,
            warning_at: DEFAULT_WARNING_DAYS,
        }
    }
}

/// Parsed `lexflow.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexflowConfig {
    pub calendar: CalendarConfig,
    pub thresholds: ThresholdsConfig,
    pub templates: Vec<TemplateSpec>,
    /// Replaces the statutory adjacency table when non-empty.
    pub transitions: BTreeMap<String, Vec<String>>,
}

// =============================================================================
// LOADING
// =============================================================================

impl LexflowConfig {
    /// Load configuration from `path`, falling back to defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self, LexflowError> {
        if !path.exists() {
            tracing::warn!(
                "Config file {} not found: using statutory defaults and no holidays",
                path.display()
            );
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LexflowError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&contents).map_err(|e| {
            LexflowError::ConfigError(format!("failed to parse {}: {}", path.display(), e))
        })?;
        tracing::info!(
            jurisdiction = %config.calendar.jurisdiction,
            version = %config.calendar.version,
            years = config.calendar.years.len(),
            "Loaded holiday calendar"
        );
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, LexflowError> {
        toml::from_str(contents).map_err(|e| LexflowError::ConfigError(e.to_string()))
    }

    /// Union of all configured years.
    ///
    /// Every date must fall in the year it is listed under.
    pub fn holidays(&self) -> Result<HolidaySet, LexflowError> {
        let mut dates = Vec::new();
        for (year, listed) in &self.calendar.years {
            let year: i32 = year.trim().parse().map_err(|_| {
                LexflowError::ConfigError(format!("calendar year '{}' is not a number", year))
            })?;
            if let Some(stray) = listed.iter().find(|d| d.year() != year) {
                return Err(LexflowError::ConfigError(format!(
                    "holiday {} is listed under year {}",
                    stray, year
                )));
            }
            dates.extend(listed.iter().copied());
        }
        Ok(HolidaySet::from_dates(dates))
    }

    /// Statutory table, or the configured override.
    pub fn transition_table(&self) -> Result<TransitionTable, LexflowError> {
        if self.transitions.is_empty() {
            return Ok(TransitionTable::statutory());
        }
        let mut edges = Vec::with_capacity(self.transitions.len());
        for (from, targets) in &self.transitions {
            let from: Stage = from.parse()?;
            let targets = targets
                .iter()
                .map(|t| t.parse::<Stage>())
                .collect::<Result<Vec<_>, _>>()?;
            edges.push((from, targets));
        }
        Ok(TransitionTable::from_edges(edges))
    }

    /// Build the workflow service this configuration describes.
    pub fn workflow(&self) -> Result<CaseWorkflow, LexflowError> {
        let thresholds =
            StatusThresholds::new(self.thresholds.critical_at, self.thresholds.warning_at)?;
        let catalog = TemplateCatalog::statutory().with_overrides(self.templates.clone())?;
        CaseWorkflow::new(
            self.transition_table()?,
            catalog,
            DeadlineEngine::with_thresholds(thresholds),
        )
    }

    /// Validate everything and produce the immutable runtime inputs.
    pub fn into_runtime(self) -> Result<Runtime, LexflowError> {
        Ok(Runtime {
            workflow: self.workflow()?,
            holidays: self.holidays()?,
            jurisdiction: self.calendar.jurisdiction,
            calendar_version: self.calendar.version,
        })
    }
}

/// Validated, immutable inputs shared by the CLI and the HTTP server.
#[derive(Debug, Clone, Default)]
pub struct Runtime {
    pub workflow: CaseWorkflow,
    pub holidays: HolidaySet,
    pub jurisdiction: String,
    pub calendar_version: String,
}

impl Runtime {
    /// Load `path` and validate it.
    pub fn load(path: &Path) -> Result<Self, LexflowError> {
        LexflowConfig::load(path)?.into_runtime()
    }
}

// =============================================================================
// TESTS
// =============================================================================
