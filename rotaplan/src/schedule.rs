/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Planner output.
//!
//! A run ends in exactly one of two explicit states:
//!
//! ```text
//! PlanOutcome::Scheduled(Schedule)          quality: optimal | feasible_within_gap
//! PlanOutcome::Infeasible(InfeasibilityReport)
//! ```
//!
//! A timed-out solve is `FeasibleWithinGap { timed_out: true }`, never
//! `Optimal`.

use serde::Serialize;

use crate::entity::{BreakAssignment, Horizon, Shift, WorkAssignment};
use crate::solver::{InfeasibilityReport, SolveStats};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveQuality {
    Optimal,
    FeasibleWithinGap { gap: f64, timed_out: bool },
}

impl SolveQuality {
    pub fn label(&self) -> &'static str {
        match self {
            SolveQuality::Optimal => "optimal",
            SolveQuality::FeasibleWithinGap { .. } => "feasible_within_gap",
        }
    }

    pub fn gap(&self) -> f64 {
        match self {
            SolveQuality::Optimal => 0.0,
            SolveQuality::FeasibleWithinGap { gap, .. } => *gap,
        }
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveQuality::Optimal)
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, SolveQuality::FeasibleWithinGap { timed_out: true, .. })
    }
}

/// One `(slot, working, on_break)` tuple of an employee's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotEntry {
    pub slot: usize,
    pub working: bool,
    pub on_break: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub horizon: Horizon,
    pub employee_ids: Vec<String>,
    pub work: WorkAssignment,
    pub breaks: BreakAssignment,
    pub quality: SolveQuality,
    /// Total worked slots.
    pub objective: i64,
    pub best_bound: i64,
    pub stats: SolveStats,
}

impl Schedule {
    pub fn shifts(&self, employee: usize) -> Vec<Shift> {
        self.work.shifts(employee)
    }

    /// The break slot inside `shift`, if any.
    pub fn break_in(&self, shift: &Shift) -> Option<usize> {
        shift
            .slots()
            .find(|&t| self.breaks.get(shift.employee, t))
    }

    /// Ordered timeline of `employee`.
    pub fn entries(&self, employee: usize) -> Vec<SlotEntry> {
        (0..self.work.num_slots())
            .map(|slot| SlotEntry {
                slot,
                working: self.work.get(employee, slot),
                on_break: self.breaks.get(employee, slot),
            })
            .collect()
    }

    pub fn total_worked(&self) -> usize {
        self.work.total()
    }

    /// Staff on duty in `slot`, breaks included.
    pub fn staffed(&self, slot: usize) -> usize {
        self.work.column_count(slot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    Scheduled(Schedule),
    Infeasible(InfeasibilityReport),
}

impl PlanOutcome {
    pub fn schedule(&self) -> Option<&Schedule> {
        match self {
            PlanOutcome::Scheduled(s) => Some(s),
            PlanOutcome::Infeasible(_) => None,
        }
    }

    pub fn infeasibility(&self) -> Option<&InfeasibilityReport> {
        match self {
            PlanOutcome::Scheduled(_) => None,
            PlanOutcome::Infeasible(r) => Some(r),
        }
    }

    pub fn is_feasible(&self) -> bool {
        matches!(self, PlanOutcome::Scheduled(_))
    }

    /// `optimal`, `feasible_within_gap` or `infeasible`.
    pub fn quality_label(&self) -> &'static str {
        match self {
            PlanOutcome::Scheduled(s) => s.quality.label(),
            PlanOutcome::Infeasible(_) => "infeasible",
        }
    }
}
