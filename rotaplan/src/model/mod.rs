/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Binary integer program for one planning problem.
//!
//! # Variables
//!
//! | Variable | Index | Cost |
//! |---|---|---|
//! | `x[e,t]`: employee `e` works slot `t` | `e·T + t` | 1 |
//! | `b[e,t]`: employee `e` is on break in slot `t` | `E·T + e·T + t` | 0 |
//!
//! # Rows
//!
//! Every row is `Σ coef·var  (≤ | ≥ | =)  rhs` with integer data and carries
//! the [`ConstraintFamily`] it was generated for plus a [`RowScope`]
//! (employee, skill, slot range).  The family/scope pair is what the solver
//! reports when it proves infeasibility and what the cut generator groups by.
//!
//! | Family | Row | Count |
//! |---|---|---|
//! | `daily_hours` | `Σ_{t∈day} x ≤ H_day` | E·days |
//! | `weekly_hours` | `Σ_{t∈week} x ≤ H_week` | E·weeks |
//! | `min_staff` | `Σ_e x[e,t] ≥ S + extra` | ≤ T |
//! | `skill_coverage` | `Σ_{e∋k} x[e,t] ≥ c_k + extra` | ≤ K·T |
//! | `rest_window` | `Σ_{t∈W} x ≤ |W| − R` | E·windows |
//! | `consecutive_hours` | `Σ_{t∈W} x ≤ M`, `|W| = M+1` | E·windows (optional) |
//! | `availability` | `x = 0` | unavailable cells |
//! | `frozen` | `x = committed` | E·τ (re-optimisation only) |
//! | `break_within_work` | `b − x ≤ 0` | E·T |
//! | `break_spacing` | `b[t] + b[t+1] ≤ 1` | E·(T−1) |
//!
//! Construction is a pure function of the [`EntityModel`]: rows are emitted
//! in a fixed order, so building twice yields identical models.

pub mod window;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::Serialize;
use tracing::{debug, info};

use crate::entity::{BreakAssignment, EntityModel, SlotGrid, WorkAssignment};
use window::rolling_windows;

pub type VarId = usize;
pub type RowId = usize;

// ── Constraint families ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFamily {
    DailyHours,
    WeeklyHours,
    MinStaff,
    SkillCoverage,
    RestWindow,
    ConsecutiveHours,
    Availability,
    Frozen,
    BreakWithinWork,
    BreakSpacing,
}

impl ConstraintFamily {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintFamily::DailyHours => "daily_hours",
            ConstraintFamily::WeeklyHours => "weekly_hours",
            ConstraintFamily::MinStaff => "min_staff",
            ConstraintFamily::SkillCoverage => "skill_coverage",
            ConstraintFamily::RestWindow => "rest_window",
            ConstraintFamily::ConsecutiveHours => "consecutive_hours",
            ConstraintFamily::Availability => "availability",
            ConstraintFamily::Frozen => "frozen",
            ConstraintFamily::BreakWithinWork => "break_within_work",
            ConstraintFamily::BreakSpacing => "break_spacing",
        }
    }

    /// Rows over break variables.
    pub fn is_break(self) -> bool {
        matches!(
            self,
            ConstraintFamily::BreakWithinWork | ConstraintFamily::BreakSpacing
        )
    }

    /// Per-slot demand rows.
    pub fn is_coverage(self) -> bool {
        matches!(
            self,
            ConstraintFamily::MinStaff | ConstraintFamily::SkillCoverage
        )
    }

    /// Per-employee caps over a slot window.
    pub fn is_capacity(self) -> bool {
        matches!(
            self,
            ConstraintFamily::DailyHours
                | ConstraintFamily::WeeklyHours
                | ConstraintFamily::RestWindow
                | ConstraintFamily::ConsecutiveHours
        )
    }
}

impl fmt::Display for ConstraintFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Work,
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub var: VarId,
    pub coef: i64,
}

/// What part of the problem a row speaks about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowScope {
    pub employee: Option<usize>,
    pub skill: Option<usize>,
    pub slots: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub family: ConstraintFamily,
    pub scope: RowScope,
    pub sense: Sense,
    pub rhs: i64,
    pub terms: Vec<Term>,
}

impl Row {
    pub fn activity(&self, values: &[bool]) -> i64 {
        self.terms
            .iter()
            .filter(|t| values.get(t.var).copied().unwrap_or(false))
            .map(|t| t.coef)
            .sum()
    }

    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        let lhs = self.activity(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs,
            Sense::Ge => lhs >= self.rhs,
            Sense::Eq => lhs == self.rhs,
        }
    }

    /// All coefficients are `+1`.
    pub fn is_unit(&self) -> bool {
        self.terms.iter().all(|t| t.coef == 1)
    }
}

// ── Model ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    num_employees: usize,
    num_slots: usize,
    employee_ids: Vec<String>,
    skill_ids: Vec<String>,
    costs: Vec<i64>,
    rows: Vec<Row>,
}

impl Model {
    /// Generates the full program for `entities`.
    pub fn build(entities: &EntityModel) -> Self {
        let horizon = entities.horizon;
        let num_slots = horizon.num_slots();
        let num_employees = entities.employees.len();

        let mut model = Model {
            num_employees,
            num_slots,
            employee_ids: entities.employees.iter().map(|e| e.id.clone()).collect(),
            skill_ids: entities.skills.iter().map(|s| s.id.clone()).collect(),
            costs: vec![0; 2 * num_employees * num_slots],
            rows: Vec::new(),
        };
        for var in 0..num_employees * num_slots {
            model.costs[var] = 1;
        }

        // Windows are shared by every employee.
        let days: Vec<Range<usize>> = (0..horizon.days as usize)
            .map(|d| horizon.day_range(d))
            .collect();
        let weeks: Vec<Range<usize>> = (0..horizon.num_weeks())
            .map(|w| horizon.week_range(w))
            .collect();
        let rest_windows = rolling_windows(
            num_slots,
            entities.rest_window_slots,
            entities.rest_stride_slots,
        );
        let streak_windows = entities
            .max_consecutive_slots
            .map(|m| rolling_windows(num_slots, m + 1, 1))
            .unwrap_or_default();

        for (e, employee) in entities.employees.iter().enumerate() {
            let daily_cap = horizon.hours_to_slots(employee.max_hours_per_day) as i64;
            for day in &days {
                model.push_window(ConstraintFamily::DailyHours, e, day.clone(), daily_cap);
            }

            let weekly_cap = horizon.hours_to_slots(employee.max_hours_per_week) as i64;
            for week in &weeks {
                model.push_window(ConstraintFamily::WeeklyHours, e, week.clone(), weekly_cap);
            }

            let rest_slots = horizon.hours_to_slots(employee.min_rest_hours);
            let rest_cap = entities.rest_window_slots.saturating_sub(rest_slots) as i64;
            for w in &rest_windows {
                model.push_window(ConstraintFamily::RestWindow, e, w.clone(), rest_cap);
            }

            if let Some(max_streak) = entities.max_consecutive_slots {
                for w in &streak_windows {
                    model.push_window(
                        ConstraintFamily::ConsecutiveHours,
                        e,
                        w.clone(),
                        max_streak as i64,
                    );
                }
            }

            for t in employee.unavailable_slots() {
                model.push_fixing(ConstraintFamily::Availability, e, t, 0);
            }
        }

        for t in 0..num_slots {
            let need = entities.staff_demand(t);
            if need > 0 {
                let terms = (0..num_employees)
                    .map(|e| Term {
                        var: model.work_var(e, t),
                        coef: 1,
                    })
                    .collect();
                model.rows.push(Row {
                    family: ConstraintFamily::MinStaff,
                    scope: RowScope {
                        employee: None,
                        skill: None,
                        slots: t..t + 1,
                    },
                    sense: Sense::Ge,
                    rhs: i64::from(need),
                    terms,
                });
            }
        }

        for k in 0..entities.skills.len() {
            let holders = entities.holders(k);
            for t in 0..num_slots {
                let need = entities.demand(k, t);
                if need == 0 {
                    continue;
                }
                let terms = holders
                    .iter()
                    .map(|&e| Term {
                        var: model.work_var(e, t),
                        coef: 1,
                    })
                    .collect();
                model.rows.push(Row {
                    family: ConstraintFamily::SkillCoverage,
                    scope: RowScope {
                        employee: None,
                        skill: Some(k),
                        slots: t..t + 1,
                    },
                    sense: Sense::Ge,
                    rhs: i64::from(need),
                    terms,
                });
            }
        }

        if let Some(frozen) = entities.frozen() {
            for e in 0..num_employees {
                for t in 0..frozen.until(e).min(num_slots) {
                    let committed = i64::from(frozen.work.get(e, t));
                    model.push_fixing(ConstraintFamily::Frozen, e, t, committed);
                }
            }
        }

        for e in 0..num_employees {
            for t in 0..num_slots {
                let (b, x) = (model.break_var(e, t), model.work_var(e, t));
                model.rows.push(Row {
                    family: ConstraintFamily::BreakWithinWork,
                    scope: RowScope {
                        employee: Some(e),
                        skill: None,
                        slots: t..t + 1,
                    },
                    sense: Sense::Le,
                    rhs: 0,
                    terms: vec![Term { var: b, coef: 1 }, Term { var: x, coef: -1 }],
                });
            }
            for t in 0..num_slots.saturating_sub(1) {
                let (b0, b1) = (model.break_var(e, t), model.break_var(e, t + 1));
                model.rows.push(Row {
                    family: ConstraintFamily::BreakSpacing,
                    scope: RowScope {
                        employee: Some(e),
                        skill: None,
                        slots: t..t + 2,
                    },
                    sense: Sense::Le,
                    rhs: 1,
                    terms: vec![Term { var: b0, coef: 1 }, Term { var: b1, coef: 1 }],
                });
            }
        }

        info!(
            employees = num_employees,
            slots = num_slots,
            vars = model.var_count(),
            rows = model.row_count(),
            "constraint model built"
        );
        for (family, count) in model.family_counts() {
            debug!(family = %family, rows = count, "  row family");
        }
        model
    }

    fn push_window(
        &mut self,
        family: ConstraintFamily,
        employee: usize,
        slots: Range<usize>,
        cap: i64,
    ) {
        let terms = slots
            .clone()
            .map(|t| Term {
                var: self.work_var(employee, t),
                coef: 1,
            })
            .collect();
        self.rows.push(Row {
            family,
            scope: RowScope {
                employee: Some(employee),
                skill: None,
                slots,
            },
            sense: Sense::Le,
            rhs: cap,
            terms,
        });
    }

    fn push_fixing(&mut self, family: ConstraintFamily, employee: usize, slot: usize, value: i64) {
        let var = self.work_var(employee, slot);
        self.rows.push(Row {
            family,
            scope: RowScope {
                employee: Some(employee),
                skill: None,
                slots: slot..slot + 1,
            },
            sense: Sense::Eq,
            rhs: value,
            terms: vec![Term { var, coef: 1 }],
        });
    }

    // ── Layout ────────────────────────────────────────────────────────────────

    pub fn num_employees(&self) -> usize {
        self.num_employees
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn var_count(&self) -> usize {
        self.costs.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn work_var(&self, employee: usize, slot: usize) -> VarId {
        employee * self.num_slots + slot
    }

    pub fn break_var(&self, employee: usize, slot: usize) -> VarId {
        (self.num_employees + employee) * self.num_slots + slot
    }

    /// `(kind, employee, slot)` of a variable.
    pub fn decode(&self, var: VarId) -> (VarKind, usize, usize) {
        let block = self.num_employees * self.num_slots;
        let (kind, local) = if var < block {
            (VarKind::Work, var)
        } else {
            (VarKind::Break, var - block)
        };
        let slots = self.num_slots.max(1);
        (kind, local / slots, local % slots)
    }

    pub fn cost(&self, var: VarId) -> i64 {
        self.costs[var]
    }

    pub fn costs(&self) -> &[i64] {
        &self.costs
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, id: RowId) -> &Row {
        &self.rows[id]
    }

    pub fn employee_id(&self, employee: usize) -> &str {
        self.employee_ids
            .get(employee)
            .map(String::as_str)
            .unwrap_or("?")
    }

    pub fn skill_id(&self, skill: usize) -> &str {
        self.skill_ids.get(skill).map(String::as_str).unwrap_or("?")
    }

    pub fn family_counts(&self) -> BTreeMap<ConstraintFamily, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.family).or_insert(0) += 1;
        }
        counts
    }

    // ── Assignments ───────────────────────────────────────────────────────────

    pub fn objective(&self, values: &[bool]) -> i64 {
        self.costs
            .iter()
            .zip(values)
            .filter(|&(_, &v)| v)
            .map(|(c, _)| c)
            .sum()
    }

    /// Rows broken by a full assignment, in row order.
    pub fn violations(&self, values: &[bool]) -> Vec<RowId> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| !row.is_satisfied_by(values))
            .map(|(id, _)| id)
            .collect()
    }

    /// Flattens work and break grids into the variable layout.
    pub fn values_from(&self, work: &WorkAssignment, breaks: &BreakAssignment) -> Vec<bool> {
        let mut values = vec![false; self.var_count()];
        for e in 0..self.num_employees {
            for t in 0..self.num_slots {
                values[self.work_var(e, t)] = work.get(e, t);
                values[self.break_var(e, t)] = breaks.get(e, t);
            }
        }
        values
    }

    pub fn work_assignment(&self, values: &[bool]) -> WorkAssignment {
        SlotGrid::from_fn(self.num_employees, self.num_slots, |e, t| {
            values.get(self.work_var(e, t)).copied().unwrap_or(false)
        })
    }

    /// One-line description of a row for diagnostics.
    pub fn describe_row(&self, id: RowId) -> String {
        let row = self.row(id);
        let mut text = format!("{} row", row.family);
        if let Some(e) = row.scope.employee {
            text.push_str(&format!(" for employee '{}'", self.employee_id(e)));
        }
        if let Some(k) = row.scope.skill {
            text.push_str(&format!(" for skill '{}'", self.skill_id(k)));
        }
        let slots = &row.scope.slots;
        if slots.len() == 1 {
            text.push_str(&format!(" at slot {}", slots.start));
        } else {
            text.push_str(&format!(" over slots {}..{}", slots.start, slots.end));
        }
        let sense = match row.sense {
            Sense::Le => "<=",
            Sense::Ge => ">=",
            Sense::Eq => "=",
        };
        text.push_str(&format!(" ({sense} {})", row.rhs));
        text
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
