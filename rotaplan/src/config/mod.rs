/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Roster configuration loading.
//!
//! A single YAML document carries everything a planning run needs.  Every
//! top-level key is optional; missing keys fall back to the defaults below.
//!
//! ```yaml
//! planner:
//!   horizon_days: 7
//!   max_hours_per_day: 8
//!   max_hours_per_week: 40
//!   min_rest_hours: 12
//!   min_staff_per_shift: 1
//!   skill_coverage:
//!     operator: 1
//! solver:
//!   time_limit_seconds: 30
//!   gap_tolerance: 0.0
//!   enable_cuts: true
//! employees:
//!   alice: [operator, maintenance]
//!   bob:
//!     skills: [operator]
//!     max_hours_per_week: 32
//!     unavailable:
//!       - { from: 0, until: 12 }
//! events:
//!   - { at: 30, kind: task_arrival, skill: operator, duration: 4 }
//! ```
//!
//! | Key | Default |
//! |---|---|
//! | `horizon_days` | 7 |
//! | `slots_per_hour` | 1 |
//! | `max_hours_per_day` | 8 |
//! | `max_hours_per_week` | 40 |
//! | `min_rest_hours` | 12 |
//! | `rest_window_hours` | 24 |
//! | `rest_window_stride_slots` | 1 |
//! | `max_consecutive_hours` | unset |
//! | `min_staff_per_shift` | 1 |
//! | `time_limit_seconds` | 30 |
//! | `gap_tolerance` | 0.0 |
//! | `enable_cuts` | true |

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ValidationError;
use crate::simulation::event::SimEvent;

/// Employee id → skill set, the plain form of the skills matrix.
pub type SkillsMatrix = BTreeMap<String, BTreeSet<String>>;

// ── Planner settings ──────────────────────────────────────────────────────────

/// Workforce rules shared by every employee unless overridden per profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlannerConfig {
    pub horizon_days: u32,
    /// Granularity of the horizon; 1 means one slot per hour.
    pub slots_per_hour: u32,
    pub max_hours_per_day: u32,
    pub max_hours_per_week: u32,
    /// Minimum rest inside every rolling rest window.
    pub min_rest_hours: u32,
    pub rest_window_hours: u32,
    /// Distance between consecutive rest-window starts, in slots.
    pub rest_window_stride_slots: u32,
    /// Optional cap on uninterrupted work; unset disables the rule.
    pub max_consecutive_hours: Option<u32>,
    pub min_staff_per_shift: u32,
    /// Skill → minimum number of holders on duty in every slot.
    pub skill_coverage: BTreeMap<String, u32>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            horizon_days: 7,
            slots_per_hour: 1,
            max_hours_per_day: 8,
            max_hours_per_week: 40,
            min_rest_hours: 12,
            rest_window_hours: 24,
            rest_window_stride_slots: 1,
            max_consecutive_hours: None,
            min_staff_per_shift: 1,
            skill_coverage: BTreeMap::new(),
        }
    }
}

impl PlannerConfig {
    /// Range checks that do not depend on the skills matrix.
    ///
    /// Skill references and per-employee overrides are checked when the
    /// [`EntityModel`](crate::entity::EntityModel) is built.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.horizon_days == 0 {
            return Err(ValidationError::EmptyHorizon);
        }
        if self.slots_per_hour == 0 || self.slots_per_hour > 60 {
            return Err(ValidationError::out_of_range(
                "planner.slots_per_hour",
                "in 1..=60",
                self.slots_per_hour,
            ));
        }
        if self.rest_window_hours == 0 {
            return Err(ValidationError::out_of_range(
                "planner.rest_window_hours",
                "greater than 0",
                self.rest_window_hours,
            ));
        }
        if self.rest_window_stride_slots == 0 {
            return Err(ValidationError::out_of_range(
                "planner.rest_window_stride_slots",
                "greater than 0",
                self.rest_window_stride_slots,
            ));
        }
        if self.max_consecutive_hours == Some(0) {
            return Err(ValidationError::out_of_range(
                "planner.max_consecutive_hours",
                "greater than 0 when set",
                0,
            ));
        }
        check_caps(
            "planner",
            self.max_hours_per_day,
            self.max_hours_per_week,
            self.min_rest_hours,
            self.rest_window_hours,
        )
    }
}

/// Shared range checks for the planner-wide caps and per-employee overrides.
pub(crate) fn check_caps(
    scope: &str,
    daily: u32,
    weekly: u32,
    rest: u32,
    rest_window: u32,
) -> Result<(), ValidationError> {
    if daily == 0 || daily > 24 {
        return Err(ValidationError::out_of_range(
            format!("{scope}.max_hours_per_day"),
            "in 1..=24",
            daily,
        ));
    }
    if weekly == 0 {
        return Err(ValidationError::out_of_range(
            format!("{scope}.max_hours_per_week"),
            "greater than 0",
            weekly,
        ));
    }
    if rest == 0 || rest >= rest_window {
        return Err(ValidationError::out_of_range(
            format!("{scope}.min_rest_hours"),
            "strictly between 0 and rest_window_hours",
            rest,
        ));
    }
    Ok(())
}

// ── Solver settings ───────────────────────────────────────────────────────────

/// Tuning knobs for the MILP solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSettings {
    /// Wall-clock budget for one solve.
    pub time_limit_seconds: f64,
    /// Accept an incumbent once `(incumbent - bound) / incumbent` is at most this.
    pub gap_tolerance: f64,
    /// Check aggregated capacity cuts before calling the backend.
    pub enable_cuts: bool,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit_seconds: 30.0,
            gap_tolerance: 0.0,
            enable_cuts: true,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.time_limit_seconds.is_finite() && self.time_limit_seconds > 0.0) {
            return Err(ValidationError::out_of_range(
                "solver.time_limit_seconds",
                "a finite number of seconds greater than 0",
                self.time_limit_seconds,
            ));
        }
        if !(0.0..=1.0).contains(&self.gap_tolerance) {
            return Err(ValidationError::out_of_range(
                "solver.gap_tolerance",
                "in [0, 1]",
                self.gap_tolerance,
            ));
        }
        Ok(())
    }
}

// ── Employees ─────────────────────────────────────────────────────────────────

/// Half-open slot range `[from, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotRange {
    pub from: usize,
    pub until: usize,
}

/// One row of the skills matrix plus optional per-employee overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmployeeProfile {
    pub skills: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hours_per_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_hours_per_week: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rest_hours: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<SlotRange>,
}

impl EmployeeProfile {
    pub fn with_skills<I, S>(skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skills: skills.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl From<BTreeSet<String>> for EmployeeProfile {
    fn from(skills: BTreeSet<String>) -> Self {
        Self {
            skills,
            ..Self::default()
        }
    }
}

// ── Private YAML deserialization types ────────────────────────────────────────

/// An employee may be written as a bare skill list or as a full profile.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmployeeEntry {
    Skills(BTreeSet<String>),
    Profile(EmployeeProfile),
}

impl From<EmployeeEntry> for EmployeeProfile {
    fn from(entry: EmployeeEntry) -> Self {
        match entry {
            EmployeeEntry::Skills(skills) => skills.into(),
            EmployeeEntry::Profile(profile) => profile,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RosterFile {
    planner: PlannerConfig,
    solver: SolverSettings,
    employees: BTreeMap<String, EmployeeEntry>,
    events: Vec<SimEvent>,
}

// ── RosterConfig ──────────────────────────────────────────────────────────────

/// Everything a planning run (or a simulated day of events) needs.
///
/// The configuration is a plain value handed to the entity builder and the
/// planner; nothing here is global.
#[derive(Debug, Clone, Default)]
pub struct RosterConfig {
    pub planner: PlannerConfig,
    pub solver: SolverSettings,
    /// Employee id → profile.  Ordered, so employee indices are stable.
    pub employees: BTreeMap<String, EmployeeProfile>,
    pub events: Vec<SimEvent>,
}

impl RosterConfig {
    /// Parses the roster YAML at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or the YAML does not match
    /// the expected layout.  Range validation happens later, when the entity
    /// model is built.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading roster configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let roster = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        info!(
            employees = roster.employees.len(),
            events = roster.events.len(),
            horizon_days = roster.planner.horizon_days,
            "Roster configuration loaded"
        );
        Ok(roster)
    }

    /// Parses a roster from an in-memory YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: RosterFile = serde_yaml::from_str(content).context("invalid roster YAML")?;

        let employees: BTreeMap<String, EmployeeProfile> = file
            .employees
            .into_iter()
            .map(|(id, entry)| (id, EmployeeProfile::from(entry)))
            .collect();

        for (id, profile) in &employees {
            debug!(
                "  Employee: {} | Skills: {:?} | Unavailable windows: {}",
                id,
                profile.skills,
                profile.unavailable.len(),
            );
        }
        if employees.is_empty() {
            warn!("Roster configuration lists no employees");
        }

        Ok(Self {
            planner: file.planner,
            solver: file.solver,
            employees,
            events: file.events,
        })
    }

    /// Builds a roster from a bare skills matrix.
    pub fn from_skills_matrix(matrix: &SkillsMatrix, planner: PlannerConfig) -> Self {
        Self {
            planner,
            solver: SolverSettings::default(),
            employees: matrix
                .iter()
                .map(|(id, skills)| (id.clone(), EmployeeProfile::from(skills.clone())))
                .collect(),
            events: Vec::new(),
        }
    }

    /// Returns the fallback roster used when no configuration file is given:
    /// five employees over three skills with the default planner settings.
    pub fn default_roster() -> Self {
        let rows: [&[&str]; 5] = [
            &["operator", "maintenance"],
            &["operator"],
            &["maintenance", "quality"],
            &["operator", "quality"],
            &["maintenance", "quality"],
        ];
        let matrix: SkillsMatrix = rows
            .iter()
            .enumerate()
            .map(|(i, skills)| {
                (
                    format!("employee_{i}"),
                    skills.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();
        Self::from_skills_matrix(&matrix, PlannerConfig::default())
    }

    /// The plain skills matrix (overrides dropped).
    pub fn skills_matrix(&self) -> SkillsMatrix {
        self.employees
            .iter()
            .map(|(id, p)| (id.clone(), p.skills.clone()))
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::event::EventKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn planner_defaults_match_documented_values() {
        let cfg = PlannerConfig::default();
        assert_eq!(cfg.horizon_days, 7);
        assert_eq!(cfg.max_hours_per_day, 8);
        assert_eq!(cfg.max_hours_per_week, 40);
        assert_eq!(cfg.min_rest_hours, 12);
        assert_eq!(cfg.min_staff_per_shift, 1);
        assert_eq!(cfg.rest_window_hours, 24);
        assert_eq!(cfg.max_consecutive_hours, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn default_roster_is_valid_and_covers_three_skills() {
        let roster = RosterConfig::default_roster();
        assert_eq!(roster.employees.len(), 5);
        let skills: BTreeSet<String> = roster
            .employees
            .values()
            .flat_map(|p| p.skills.iter().cloned())
            .collect();
        assert_eq!(skills.len(), 3);
        assert!(roster.planner.validate().is_ok());
        assert!(roster.solver.validate().is_ok());
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn zero_horizon_is_rejected() {
        let cfg = PlannerConfig {
            horizon_days: 0,
            ..PlannerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ValidationError::EmptyHorizon));
    }

    #[test]
    fn rest_at_or_above_window_is_rejected() {
        let cfg = PlannerConfig {
            min_rest_hours: 24,
            ..PlannerConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "planner.min_rest_hours"
        ));
    }

    #[test]
    fn zero_daily_cap_is_rejected() {
        let cfg = PlannerConfig {
            max_hours_per_day: 0,
            ..PlannerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn solver_settings_ranges() {
        assert!(SolverSettings::default().validate().is_ok());
        let bad_gap = SolverSettings {
            gap_tolerance: 1.5,
            ..SolverSettings::default()
        };
        assert!(bad_gap.validate().is_err());
        let nan_gap = SolverSettings {
            gap_tolerance: f64::NAN,
            ..SolverSettings::default()
        };
        assert!(nan_gap.validate().is_err());
        let no_time = SolverSettings {
            time_limit_seconds: 0.0,
            ..SolverSettings::default()
        };
        assert!(no_time.validate().is_err());
    }

    // ── load_from_file ────────────────────────────────────────────────────────

    #[test]
    fn load_full_roster_yaml() {
        let yaml = r#"
planner:
  horizon_days: 2
  max_hours_per_week: 32
  max_consecutive_hours: 6
  skill_coverage:
    operator: 1
solver:
  time_limit_seconds: 5
  gap_tolerance: 0.05
  enable_cuts: false
employees:
  alice: [operator, maintenance]
  bob:
    skills: [operator]
    max_hours_per_day: 6
    unavailable:
      - { from: 0, until: 12 }
events:
  - { at: 10, kind: task_arrival, skill: operator, duration: 4, staff: 2 }
  - { at: 20, kind: availability_change, employee: alice, available: false }
"#;
        let f = yaml_tempfile(yaml);
        let roster = RosterConfig::load_from_file(f.path()).unwrap();

        assert_eq!(roster.planner.horizon_days, 2);
        assert_eq!(roster.planner.max_hours_per_week, 32);
        assert_eq!(roster.planner.max_hours_per_day, 8, "default kept");
        assert_eq!(roster.planner.max_consecutive_hours, Some(6));
        assert_eq!(roster.planner.skill_coverage.get("operator"), Some(&1));

        assert_eq!(roster.solver.time_limit_seconds, 5.0);
        assert!(!roster.solver.enable_cuts);

        let alice = &roster.employees["alice"];
        assert!(alice.skills.contains("maintenance"));
        assert_eq!(alice.max_hours_per_day, None);

        let bob = &roster.employees["bob"];
        assert_eq!(bob.max_hours_per_day, Some(6));
        assert_eq!(bob.unavailable, vec![SlotRange { from: 0, until: 12 }]);

        assert_eq!(roster.events.len(), 2);
        assert_eq!(roster.events[0].at, 10);
        assert!(matches!(
            roster.events[0].kind,
            EventKind::TaskArrival { staff: 2, duration: 4, .. }
        ));
        assert!(matches!(
            roster.events[1].kind,
            EventKind::AvailabilityChange { available: false, until: None, .. }
        ));
    }

    #[test]
    fn missing_sections_use_defaults() {
        let f = yaml_tempfile("employees:\n  solo: [operator]\n");
        let roster = RosterConfig::load_from_file(f.path()).unwrap();
        assert_eq!(roster.planner, PlannerConfig::default());
        assert_eq!(roster.solver, SolverSettings::default());
        assert!(roster.events.is_empty());
        assert_eq!(roster.employees.len(), 1);
    }

    #[test]
    fn unknown_planner_key_is_rejected() {
        let f = yaml_tempfile("planner:\n  horizon_dayz: 3\n");
        assert!(RosterConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = RosterConfig::load_from_file(Path::new("/nonexistent/path/roster.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(RosterConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn skills_matrix_round_trips_through_roster() {
        let roster = RosterConfig::default_roster();
        let matrix = roster.skills_matrix();
        let rebuilt = RosterConfig::from_skills_matrix(&matrix, roster.planner.clone());
        assert_eq!(rebuilt.employees, roster.employees);
    }
}
