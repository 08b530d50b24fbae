/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Read-only views of a [`PlanOutcome`] for downstream consumers.
//!
//! * [`ScheduleDocument`]: the JSON payload (quality, gap, per-employee
//!   timeline and shifts, coverage views).
//! * [`summary_lines`]: a readable per-employee shift list.
//! * [`coverage_matrix`] / [`skill_coverage`]: staff counts per slot.
//!
//! None of these re-derive scheduling decisions; they only reshape the
//! schedule.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::entity::{EntityModel, Horizon, Shift};
use crate::schedule::{PlanOutcome, Schedule, SlotEntry};
use crate::solver::{InfeasibilityReport, SolveStats};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftRecord {
    pub start: usize,
    pub end: usize,
    pub break_slot: Option<usize>,
    /// `Day d: HH:MM - HH:MM`
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeSchedule {
    pub id: String,
    pub skills: Vec<String>,
    pub worked_slots: usize,
    pub shifts: Vec<ShiftRecord>,
    pub slots: Vec<SlotEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDocument {
    /// `optimal`, `feasible_within_gap` or `infeasible`.
    pub quality: &'static str,
    /// Present only when the schedule is not proven optimal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
    pub timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_bound: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<InfeasibilityReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SolveStats>,
    pub horizon_slots: usize,
    pub slots_per_hour: u32,
    pub employees: Vec<EmployeeSchedule>,
    /// Staff on duty per `[day][slot of day]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<Vec<Vec<usize>>>,
    /// Holders of each skill on duty, per slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_coverage: Option<BTreeMap<String, Vec<usize>>>,
}

impl ScheduleDocument {
    pub fn from_outcome(outcome: &PlanOutcome, entities: &EntityModel) -> Self {
        let horizon = entities.horizon;
        let mut doc = Self {
            quality: outcome.quality_label(),
            gap: None,
            timed_out: false,
            objective: None,
            best_bound: None,
            diagnostics: None,
            stats: None,
            horizon_slots: horizon.num_slots(),
            slots_per_hour: horizon.slots_per_hour,
            employees: Vec::with_capacity(entities.employees.len()),
            coverage: None,
            skill_coverage: None,
        };

        match outcome {
            PlanOutcome::Scheduled(schedule) => {
                if !schedule.quality.is_optimal() {
                    doc.gap = Some(schedule.quality.gap());
                }
                doc.timed_out = schedule.quality.timed_out();
                doc.objective = Some(schedule.objective);
                doc.best_bound = Some(schedule.best_bound);
                doc.stats = Some(schedule.stats.clone());
                doc.coverage = Some(coverage_matrix(schedule));
                doc.skill_coverage = Some(skill_coverage(schedule, entities));
            }
            PlanOutcome::Infeasible(report) => {
                doc.diagnostics = Some(report.clone());
            }
        }

        for (e, employee) in entities.employees.iter().enumerate() {
            let mut record = EmployeeSchedule {
                id: employee.id.clone(),
                skills: employee.skills.iter().cloned().collect(),
                worked_slots: 0,
                shifts: Vec::new(),
                slots: Vec::new(),
            };
            if let Some(schedule) = outcome.schedule() {
                record.worked_slots = schedule.work.count_in(e, 0..schedule.work.num_slots());
                record.shifts = schedule
                    .shifts(e)
                    .iter()
                    .map(|shift| ShiftRecord {
                        start: shift.start,
                        end: shift.end,
                        break_slot: schedule.break_in(shift),
                        label: shift_label(&horizon, shift),
                    })
                    .collect();
                record.slots = schedule.entries(e);
            }
            doc.employees.push(record);
        }
        doc
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the document as pretty JSON to `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json().context("Failed to serialize schedule")?;
        std::fs::write(path, json)
            .with_context(|| format!("Cannot write schedule file: {}", path.display()))?;
        info!("Schedule written to: {}", path.display());
        Ok(())
    }
}

/// `Day d: HH:MM - HH:MM`, days counted from 1.  A shift ending at
/// midnight ends at `24:00`.
pub fn shift_label(horizon: &Horizon, shift: &Shift) -> String {
    let start = horizon.slot(shift.start);
    let end = horizon.slot(shift.end);
    let end_clock = if end.minute_of_day == 0 && shift.end > shift.start {
        "24:00".to_string()
    } else {
        end.clock()
    };
    format!("Day {}: {} - {end_clock}", start.day + 1, start.clock())
}

/// Staff on duty per `[day][slot of day]`.
pub fn coverage_matrix(schedule: &Schedule) -> Vec<Vec<usize>> {
    let horizon = schedule.horizon;
    (0..horizon.days as usize)
        .map(|d| horizon.day_range(d).map(|t| schedule.staffed(t)).collect())
        .collect()
}

/// Holders of each skill on duty, per slot.
pub fn skill_coverage(schedule: &Schedule, entities: &EntityModel) -> BTreeMap<String, Vec<usize>> {
    let num_slots = schedule.work.num_slots();
    entities
        .skills
        .iter()
        .enumerate()
        .map(|(k, skill)| {
            let holders = entities.holders(k);
            let series = (0..num_slots)
                .map(|t| holders.iter().filter(|&&e| schedule.work.get(e, t)).count())
                .collect();
            (skill.id.clone(), series)
        })
        .collect()
}

/// Readable summary: one header line, then per employee the shifts and
/// breaks.  An infeasible outcome renders a diagnostics block instead.
pub fn summary_lines(outcome: &PlanOutcome) -> Vec<String> {
    let schedule = match outcome {
        PlanOutcome::Scheduled(schedule) => schedule,
        PlanOutcome::Infeasible(report) => {
            let families: Vec<&str> = report.families.iter().map(|f| f.as_str()).collect();
            return vec![
                "INFEASIBLE - see diagnostics".to_string(),
                format!("  cause: {:?}", report.cause),
                format!("  families: {}", families.join(", ")),
                format!("  detail: {}", report.detail),
            ];
        }
    };

    let mut lines = Vec::new();
    let header = match schedule.quality {
        q if q.is_optimal() => format!("Schedule: optimal, {} worked slots", schedule.objective),
        q => format!(
            "Schedule: feasible within gap {:.2}% (bound {}){}, {} worked slots",
            q.gap() * 100.0,
            schedule.best_bound,
            if q.timed_out() { ", time limit reached" } else { "" },
            schedule.objective,
        ),
    };
    lines.push(header);

    let horizon = schedule.horizon;
    for (e, id) in schedule.employee_ids.iter().enumerate() {
        let shifts = schedule.shifts(e);
        if shifts.is_empty() {
            lines.push(format!("{id}: off"));
            continue;
        }
        lines.push(format!("{id}:"));
        for shift in &shifts {
            let brk = schedule
                .break_in(shift)
                .map(|b| horizon.slot(b).clock())
                .unwrap_or_else(|| "none".to_string());
            lines.push(format!("  {} (break {brk})", shift_label(&horizon, shift)));
        }
    }
    lines
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlannerConfig, SolverSettings};
    use crate::model::tests::entities;
    use crate::planner::Planner;

    fn one_day() -> PlannerConfig {
        PlannerConfig {
            horizon_days: 1,
            ..PlannerConfig::default()
        }
    }

    fn plan(rows: &[(&str, &[&str])], cfg: &PlannerConfig) -> (PlanOutcome, EntityModel) {
        let ent = entities(rows, cfg);
        let planner = Planner::new(SolverSettings {
            time_limit_seconds: 10.0,
            ..SolverSettings::default()
        })
        .unwrap();
        (planner.plan(&ent).unwrap(), ent)
    }

    #[test]
    fn shift_labels_use_wall_clock() {
        let horizon = Horizon {
            days: 2,
            slots_per_hour: 2,
        };
        let shift = Shift {
            employee: 0,
            start: 48 + 16,
            end: 48 + 33,
        };
        assert_eq!(shift_label(&horizon, &shift), "Day 2: 08:00 - 16:30");
    }

    #[test]
    fn shift_ending_at_midnight_reads_24_00() {
        let horizon = Horizon {
            days: 2,
            slots_per_hour: 1,
        };
        let evening = Shift {
            employee: 0,
            start: 16,
            end: 24,
        };
        assert_eq!(shift_label(&horizon, &evening), "Day 1: 16:00 - 24:00");

        let last = Shift {
            employee: 0,
            start: 40,
            end: 48,
        };
        assert_eq!(shift_label(&horizon, &last), "Day 2: 16:00 - 24:00");

        let overnight = Shift {
            employee: 0,
            start: 22,
            end: 26,
        };
        assert_eq!(shift_label(&horizon, &overnight), "Day 1: 22:00 - 02:00");
    }

    #[test]
    fn document_carries_timeline_and_shifts() {
        let (outcome, ent) = plan(&[("a", &["op"]), ("b", &["op"]), ("c", &["op"])], &one_day());
        let doc = ScheduleDocument::from_outcome(&outcome, &ent);

        assert_eq!(doc.quality, "optimal");
        assert_eq!(doc.gap, None);
        assert_eq!(doc.objective, Some(24));
        assert_eq!(doc.employees.len(), 3);
        for emp in &doc.employees {
            assert_eq!(emp.slots.len(), 24);
            for shift in &emp.shifts {
                let b = shift.break_slot.unwrap();
                assert!(emp.slots[b].working && emp.slots[b].on_break);
            }
        }

        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(json["quality"], "optimal");
        assert!(json.get("diagnostics").is_none());
        assert_eq!(json["employees"][0]["slots"].as_array().unwrap().len(), 24);
        assert_eq!(json["coverage"][0].as_array().unwrap().len(), 24);
        assert_eq!(json["skill_coverage"]["op"].as_array().unwrap().len(), 24);
    }

    #[test]
    fn infeasible_document_has_diagnostics_and_no_timeline() {
        let (outcome, ent) = plan(&[("a", &["op"]), ("b", &["op"])], &one_day());
        let doc = ScheduleDocument::from_outcome(&outcome, &ent);
        assert_eq!(doc.quality, "infeasible");
        assert!(doc.diagnostics.is_some());
        assert!(doc.employees.iter().all(|e| e.slots.is_empty()));
        assert!(doc.coverage.is_none() && doc.skill_coverage.is_none());

        let lines = summary_lines(&outcome);
        assert!(lines[0].starts_with("INFEASIBLE"));
    }

    #[test]
    fn write_to_creates_json_file() {
        let (outcome, ent) = plan(&[("a", &["op"]), ("b", &["op"]), ("c", &["op"])], &one_day());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        ScheduleDocument::from_outcome(&outcome, &ent)
            .write_to(&path)
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"quality\": \"optimal\""));
    }

    #[test]
    fn coverage_views_match_the_schedule() {
        let mut cfg = one_day();
        cfg.skill_coverage.insert("qa".into(), 1);
        let (outcome, ent) = plan(
            &[("a", &["op", "qa"]), ("b", &["qa"]), ("c", &["op", "qa"])],
            &cfg,
        );
        let schedule = outcome.schedule().unwrap();

        let matrix = coverage_matrix(schedule);
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix[0].len(), 24);
        assert!(matrix[0].iter().all(|&n| n >= 1));

        let by_skill = skill_coverage(schedule, &ent);
        assert!(by_skill["qa"].iter().all(|&n| n >= 1));
        assert_eq!(by_skill["op"].len(), 24);

        let doc = ScheduleDocument::from_outcome(&outcome, &ent);
        assert_eq!(doc.coverage.as_ref(), Some(&matrix));
        assert_eq!(doc.skill_coverage.as_ref(), Some(&by_skill));
    }

    #[test]
    fn summary_lists_shifts_with_breaks() {
        let (outcome, _) = plan(&[("a", &["op"]), ("b", &["op"]), ("c", &["op"])], &one_day());
        let lines = summary_lines(&outcome);
        assert_eq!(lines[0], "Schedule: optimal, 24 worked slots");
        assert!(lines.iter().any(|l| l.starts_with("  Day 1: ") && l.contains("(break ")));
    }
}
